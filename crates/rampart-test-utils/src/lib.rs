// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

// Allowing `unwrap`s in test utils.
#![allow(clippy::unwrap_used)]

//! Utility functions for tests.

use rampart_core::{
    event::{ErrorKind, RequestEvent, RequestOutcome},
    shape::{StagePlan, StageSpec},
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rand_distr::Uniform;

/// Response size stamped on synthetic successful events.
pub const FIXTURE_RESPONSE_BYTES: u64 = 1024;

/// Returns a small three-stage plan for tests.
pub fn small_plan() -> StagePlan {
    StagePlan::new(vec![
        StageSpec::new("Warm-up", 5, 1.0, 60.0),
        StageSpec::new("Stress", 10, 1.0, 60.0),
        StageSpec::new("Peak", 20, 2.0, 60.0),
    ])
    .unwrap()
}

/// Returns `count` latencies drawn uniformly from `[low_ms, high_ms]` with
/// a deterministic seed.
pub fn uniform_latencies(count: usize, low_ms: f64, high_ms: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let distribution = Uniform::new_inclusive(low_ms, high_ms);
    (0..count).map(|_| rng.sample(distribution)).collect()
}

/// Returns a deterministically shuffled copy of the sample.
pub fn shuffled(sample: &[f64], seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut copy = sample.to_vec();
    copy.shuffle(&mut rng);
    copy
}

/// The nearest-rank percentile a correctly aggregated sample must report.
pub fn expected_nearest_rank(sample: &[f64], percentile: f64) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (percentile / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

/// Returns successful events attributed to one stage, with completion
/// times spread evenly across the stage's interval.
pub fn successful_stage_events(
    stage_name: &str,
    start_seconds: f64,
    duration_seconds: f64,
    latencies_ms: &[f64],
) -> Vec<RequestEvent> {
    spread(start_seconds, duration_seconds, latencies_ms.len())
        .zip(latencies_ms)
        .map(|(elapsed, latency_ms)| {
            RequestEvent::from_outcome(
                RequestOutcome::success(*latency_ms, FIXTURE_RESPONSE_BYTES),
                stage_name,
                elapsed,
            )
        })
        .collect()
}

/// Returns failed events attributed to one stage, with completion times
/// spread evenly across the stage's interval.
///
/// When `latency_ms` is `None` the failures carry no measurement (e.g.
/// connections that never completed) and stay out of latency samples.
pub fn failed_stage_events(
    stage_name: &str,
    start_seconds: f64,
    duration_seconds: f64,
    count: usize,
    error_kind: ErrorKind,
    latency_ms: Option<f64>,
) -> Vec<RequestEvent> {
    spread(start_seconds, duration_seconds, count)
        .map(|elapsed| {
            RequestEvent::from_outcome(
                RequestOutcome::failure(error_kind, latency_ms),
                stage_name,
                elapsed,
            )
        })
        .collect()
}

fn spread(
    start_seconds: f64,
    duration_seconds: f64,
    count: usize,
) -> impl Iterator<Item = f64> {
    let step = duration_seconds / (count.max(1)) as f64;
    (0..count).map(move |i| start_seconds + (i as f64 + 0.5) * step)
}

/// Returns latencies for a stage that should classify as degraded under
/// the default thresholds: p95 lands between the healthy and failed
/// latency bounds.
pub fn degraded_latencies(count: usize, seed: u64) -> Vec<f64> {
    uniform_latencies(count, 6_000.0, 12_000.0, seed)
}
