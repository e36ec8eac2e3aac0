// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure reduction of the event log into per-stage and overall statistics.
//!
//! Runs once, after all load-generating activity has ceased, over a frozen
//! log. Every division guards the zero denominator and degrades to zero
//! (or `null` for latency fields) instead of failing, so a report is
//! producible even for an empty or all-failed run.

use indexmap::IndexMap;
use rampart_core::{event::RequestEvent, shape::StagePlan};
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, Classifier};

/// Number of error codes surfaced in the `top_errors` listing.
const TOP_ERRORS: usize = 5;

/// Request counts and derived rates for one scope (stage or overall).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCounts {
    /// Completed requests in scope.
    pub total: u64,
    /// Requests that succeeded.
    pub successful: u64,
    /// Requests that failed.
    pub failed: u64,
    /// `successful / total`, 0 when the scope is empty.
    pub success_rate: f64,
    /// `failed / total`, 0 when the scope is empty.
    pub error_rate: f64,
}

impl RequestCounts {
    fn from_events(events: &[&RequestEvent]) -> Self {
        let total = events.len() as u64;
        let failed = events.iter().filter(|event| !event.success).count() as u64;
        let successful = total - failed;
        Self {
            total,
            successful,
            failed,
            success_rate: safe_ratio(successful, total),
            error_rate: safe_ratio(failed, total),
        }
    }
}

/// Latency distribution of one scope, in milliseconds.
///
/// All fields are `null` when the scope holds no measured latency; failed
/// requests enter the sample only when they carry a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Smallest measured latency.
    pub min: Option<f64>,
    /// Largest measured latency.
    pub max: Option<f64>,
    /// 50th percentile, nearest rank.
    pub median: Option<f64>,
    /// Arithmetic mean.
    pub average: Option<f64>,
    /// 95th percentile, nearest rank.
    pub p95: Option<f64>,
    /// 99th percentile, nearest rank.
    pub p99: Option<f64>,
}

impl LatencyStats {
    fn from_events(events: &[&RequestEvent]) -> Self {
        let mut sample: Vec<f64> = events
            .iter()
            .filter_map(|event| event.measured_latency())
            .collect();
        sample.sort_by(f64::total_cmp);

        if sample.is_empty() {
            return Self {
                min: None,
                max: None,
                median: None,
                average: None,
                p95: None,
                p99: None,
            };
        }

        let sum: f64 = sample.iter().sum();
        Self {
            min: sample.first().copied(),
            max: sample.last().copied(),
            median: nearest_rank(&sample, 50.0),
            average: Some(sum / sample.len() as f64),
            p95: nearest_rank(&sample, 95.0),
            p99: nearest_rank(&sample, 99.0),
        }
    }
}

/// Throughput and payload statistics of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStats {
    /// Completed requests per second over the scope's declared duration.
    pub requests_per_second: f64,
    /// Mean response size across events with a known size, 0 when none.
    pub average_response_bytes: f64,
}

impl ThroughputStats {
    fn from_events(events: &[&RequestEvent], duration_seconds: f64) -> Self {
        let requests_per_second = if duration_seconds > 0.0 {
            events.len() as f64 / duration_seconds
        } else {
            0.0
        };

        let sizes: Vec<u64> = events
            .iter()
            .filter_map(|event| event.response_bytes)
            .collect();
        let average_response_bytes = if sizes.is_empty() {
            0.0
        } else {
            sizes.iter().sum::<u64>() as f64 / sizes.len() as f64
        };

        Self {
            requests_per_second,
            average_response_bytes,
        }
    }
}

/// One entry of the `top_errors` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCount {
    /// Stable error-kind label, e.g. `HTTP_502`.
    pub error_code: String,
    /// Occurrences in scope.
    pub count: u64,
}

/// Error-kind distribution of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    /// Failed requests in scope.
    pub total_errors: u64,
    /// Occurrences per error-kind label, in first-seen order.
    pub distribution: IndexMap<String, u64>,
    /// The most frequent error kinds, largest first.
    pub top_errors: Vec<ErrorCount>,
}

impl ErrorBreakdown {
    fn from_events(events: &[&RequestEvent]) -> Self {
        let mut distribution: IndexMap<String, u64> = IndexMap::new();
        for event in events {
            if let Some(kind) = &event.error_kind {
                *distribution.entry(kind.label()).or_insert(0) += 1;
            }
        }

        let total_errors = distribution.values().sum();
        let mut ranked: Vec<ErrorCount> = distribution
            .iter()
            .map(|(error_code, count)| ErrorCount {
                error_code: error_code.clone(),
                count: *count,
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(TOP_ERRORS);

        Self {
            total_errors,
            distribution,
            top_errors: ranked,
        }
    }
}

/// Derived statistics and classification of one declared stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    /// The stage's declared name.
    pub name: String,
    /// The stage's declared target concurrency.
    pub target_users: u32,
    /// The stage's declared duration.
    pub duration_seconds: f64,
    /// Request counts and rates.
    pub requests: RequestCounts,
    /// Latency distribution in milliseconds.
    pub latency_ms: LatencyStats,
    /// Throughput and payload statistics.
    pub throughput: ThroughputStats,
    /// Error-kind distribution.
    pub error_codes: ErrorBreakdown,
    /// Health classification against the configured thresholds.
    pub classification: Classification,
}

/// Unscoped statistics across the full event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    /// Completed requests across the run.
    pub total_requests: u64,
    /// Requests that succeeded.
    pub successful_requests: u64,
    /// Requests that failed.
    pub failed_requests: u64,
    /// `successful / total`, 0 for an empty run.
    pub success_rate: f64,
    /// `failed / total`, 0 for an empty run.
    pub error_rate: f64,
    /// Latency distribution in milliseconds.
    pub latency_ms: LatencyStats,
    /// Throughput over the declared total duration.
    pub throughput: ThroughputStats,
}

/// The p-th percentile of an ascending sample by the nearest-rank method:
/// index `ceil(p/100 * n) - 1`, clamped to the sample bounds.
pub fn nearest_rank(sorted_sample: &[f64], percentile: f64) -> Option<f64> {
    if sorted_sample.is_empty() {
        return None;
    }
    let n = sorted_sample.len();
    let rank = (percentile / 100.0 * n as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(n - 1);
    Some(sorted_sample[index])
}

fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Partitions events by stage in declared order.
///
/// A stage with no events still appears with an empty partition. Events
/// carrying a stage name outside the plan (possible only for hand-built
/// logs) are ignored.
fn partition<'a>(
    plan: &'a StagePlan,
    events: &'a [RequestEvent],
) -> IndexMap<&'a str, Vec<&'a RequestEvent>> {
    let mut by_stage: IndexMap<&str, Vec<&RequestEvent>> = plan
        .stages()
        .iter()
        .map(|stage| (stage.name.as_str(), Vec::new()))
        .collect();
    for event in events {
        match by_stage.get_mut(event.stage_name.as_str()) {
            Some(bucket) => bucket.push(event),
            None => tracing::debug!(
                stage_name = %event.stage_name,
                "ignoring event attributed to an undeclared stage"
            ),
        }
    }
    by_stage
}

/// Reduces the event log into one summary per declared stage, in declared
/// order.
pub fn per_stage(
    plan: &StagePlan,
    events: &[RequestEvent],
    classifier: &Classifier,
) -> Vec<StageSummary> {
    let by_stage = partition(plan, events);

    plan.stages()
        .iter()
        .map(|stage| {
            let bucket = &by_stage[stage.name.as_str()];
            let requests = RequestCounts::from_events(bucket);
            let latency_ms = LatencyStats::from_events(bucket);
            let throughput = ThroughputStats::from_events(bucket, stage.duration_seconds);
            let error_codes = ErrorBreakdown::from_events(bucket);
            let classification = classifier.classify(requests.error_rate, latency_ms.p95);
            tracing::debug!(
                stage = %stage.name,
                total = requests.total,
                error_rate = requests.error_rate,
                p95 = ?latency_ms.p95,
                ?classification,
                "reduced stage"
            );
            StageSummary {
                name: stage.name.clone(),
                target_users: stage.target_users,
                duration_seconds: stage.duration_seconds,
                requests,
                latency_ms,
                throughput,
                error_codes,
                classification,
            }
        })
        .collect()
}

/// Reduces the full event log, unscoped.
pub fn overall(plan: &StagePlan, events: &[RequestEvent]) -> OverallStatistics {
    let all: Vec<&RequestEvent> = events.iter().collect();
    let counts = RequestCounts::from_events(&all);
    OverallStatistics {
        total_requests: counts.total,
        successful_requests: counts.successful,
        failed_requests: counts.failed,
        success_rate: counts.success_rate,
        error_rate: counts.error_rate,
        latency_ms: LatencyStats::from_events(&all),
        throughput: ThroughputStats::from_events(&all, plan.total_duration()),
    }
}

/// Error-kind distribution across the full event log.
pub fn overall_errors(events: &[RequestEvent]) -> ErrorBreakdown {
    let all: Vec<&RequestEvent> = events.iter().collect();
    ErrorBreakdown::from_events(&all)
}
