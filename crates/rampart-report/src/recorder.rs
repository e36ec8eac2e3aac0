// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Append-only ingestion of completed-request outcomes.
//!
//! Stage attribution happens at ingestion time: a request's *completion*
//! instant decides which stage it counts against, so a slow request started
//! near the end of one stage but finishing after the next begins is counted
//! against the later stage. Completions arriving at or after the declared
//! total duration are rejected; the aggregator always operates on a frozen
//! snapshot.

use std::sync::{Arc, Mutex};

use rampart_core::{
    ElapsedSeconds,
    event::{RequestEvent, RequestOutcome},
    shape::LoadShape,
};
use tokio::{
    sync::{Notify, mpsc},
    task::JoinHandle,
};

/// Queue depth of the collector's ingestion channel.
const INGEST_QUEUE_DEPTH: usize = 1024;

fn stamp(
    shape: &LoadShape,
    outcome: RequestOutcome,
    elapsed_seconds: ElapsedSeconds,
) -> Option<RequestEvent> {
    match shape.stage_name_at(elapsed_seconds) {
        Some(stage_name) => Some(RequestEvent::from_outcome(
            outcome,
            stage_name,
            elapsed_seconds,
        )),
        None => {
            tracing::debug!(
                elapsed_seconds,
                "dropping completion received after the run ended"
            );
            None
        }
    }
}

/// Mutex-serialized event log, safe to share across concurrent callers.
#[derive(Debug)]
pub struct EventRecorder {
    shape: LoadShape,
    log: Mutex<Vec<RequestEvent>>,
}

impl EventRecorder {
    /// Creates a recorder attributing events through the given shape.
    pub fn new(shape: LoadShape) -> Self {
        Self {
            shape,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Stamps the outcome with the stage active at `elapsed_seconds` and
    /// appends it to the log.
    ///
    /// Completions at or after the total declared duration are dropped:
    /// the run is over and no further events are accepted.
    pub fn record(&self, outcome: RequestOutcome, elapsed_seconds: ElapsedSeconds) {
        if let Some(event) = stamp(&self.shape, outcome, elapsed_seconds) {
            self.log
                .lock()
                .expect("event log mutex poisoned")
                .push(event);
        }
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.log.lock().expect("event log mutex poisoned").len()
    }

    /// Whether no event has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy-on-read snapshot for live inspection while virtual users may
    /// still be appending.
    pub fn snapshot(&self) -> Vec<RequestEvent> {
        self.log.lock().expect("event log mutex poisoned").clone()
    }

    /// Consumes the recorder, returning the frozen log.
    pub fn into_events(self) -> Vec<RequestEvent> {
        self.log
            .into_inner()
            .expect("event log mutex poisoned")
    }
}

/// Handle cloned into each virtual-user task to report completions.
#[derive(Debug, Clone)]
pub struct EventReporter {
    tx: mpsc::Sender<(RequestOutcome, ElapsedSeconds)>,
}

impl EventReporter {
    /// Sends one completed outcome to the collector.
    ///
    /// A reporter that outlives its collector drops the completion; the
    /// run has already been frozen at that point.
    pub async fn report(&self, outcome: RequestOutcome, elapsed_seconds: ElapsedSeconds) {
        if self.tx.send((outcome, elapsed_seconds)).await.is_err() {
            tracing::debug!(
                elapsed_seconds,
                "event reporter outlived its collector; completion dropped"
            );
        }
    }
}

/// Single-writer collector task owning the event log.
///
/// All appends are serialized through the channel, so concurrent virtual
/// users never contend on the log itself. [`EventCollector::finish`] drains
/// the queue once every reporter is dropped; [`EventCollector::halt`]
/// freezes the log immediately on an external abort, even while reporters
/// are still alive.
#[derive(Debug)]
pub struct EventCollector {
    tx: mpsc::Sender<(RequestOutcome, ElapsedSeconds)>,
    stop: Arc<Notify>,
    handle: JoinHandle<Vec<RequestEvent>>,
}

impl EventCollector {
    /// Spawns the collector task.
    pub fn spawn(shape: LoadShape) -> Self {
        let (tx, mut rx) = mpsc::channel(INGEST_QUEUE_DEPTH);
        let stop = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&stop);

        let handle = tokio::spawn(async move {
            let mut events = Vec::new();
            loop {
                tokio::select! {
                    biased;
                    () = stop_signal.notified() => break,
                    received = rx.recv() => match received {
                        Some((outcome, elapsed_seconds)) => {
                            if let Some(event) = stamp(&shape, outcome, elapsed_seconds) {
                                events.push(event);
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::info!(recorded = events.len(), "event collector stopped");
            events
        });

        Self { tx, stop, handle }
    }

    /// A new reporter handle for one virtual-user task.
    pub fn reporter(&self) -> EventReporter {
        EventReporter {
            tx: self.tx.clone(),
        }
    }

    /// Waits for all reporters to drop, drains the queue, and returns the
    /// frozen log.
    pub async fn finish(self) -> Vec<RequestEvent> {
        drop(self.tx);
        self.handle.await.expect("event collector task panicked")
    }

    /// Freezes the log immediately, discarding queued and in-flight
    /// completions. Used on an external abort.
    pub async fn halt(self) -> Vec<RequestEvent> {
        self.stop.notify_one();
        drop(self.tx);
        self.handle.await.expect("event collector task panicked")
    }
}

#[cfg(test)]
mod tests {
    use rampart_core::{
        event::ErrorKind,
        shape::{StagePlan, StageSpec},
    };

    use super::*;

    fn two_stage_shape() -> LoadShape {
        LoadShape::from(
            StagePlan::new(vec![
                StageSpec::new("Ramp", 5, 1.0, 10.0),
                StageSpec::new("Hold", 10, 1.0, 10.0),
            ])
            .expect("plan is valid"),
        )
    }

    #[test]
    fn completion_time_decides_the_stage() {
        let recorder = EventRecorder::new(two_stage_shape());
        // Started during "Ramp", but completed 2.5s into "Hold".
        recorder.record(RequestOutcome::success(4300.0, 1024), 12.5);
        let events = recorder.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stage_name, "Hold");
        assert_eq!(events[0].timestamp_seconds, 12.5);
    }

    #[test]
    fn boundary_completion_belongs_to_the_later_stage() {
        let recorder = EventRecorder::new(two_stage_shape());
        recorder.record(RequestOutcome::success(50.0, 256), 10.0);
        let events = recorder.into_events();
        assert_eq!(events[0].stage_name, "Hold");
    }

    #[test]
    fn completions_after_the_run_are_dropped() {
        let recorder = EventRecorder::new(two_stage_shape());
        recorder.record(RequestOutcome::success(50.0, 256), 20.0);
        recorder.record(
            RequestOutcome::failure(ErrorKind::Timeout, None),
            3600.0,
        );
        assert!(recorder.is_empty());
    }

    #[test]
    fn snapshot_is_a_frozen_copy() {
        let recorder = EventRecorder::new(two_stage_shape());
        recorder.record(RequestOutcome::success(10.0, 100), 1.0);
        let snapshot = recorder.snapshot();
        recorder.record(RequestOutcome::success(20.0, 100), 2.0);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn collector_serializes_concurrent_reporters() {
        let collector = EventCollector::spawn(two_stage_shape());

        let mut tasks = Vec::new();
        for worker in 0..8u32 {
            let reporter = collector.reporter();
            tasks.push(tokio::spawn(async move {
                for i in 0..25u32 {
                    let elapsed = f64::from(worker * 25 + i) * 0.05;
                    reporter
                        .report(RequestOutcome::success(42.0, 512), elapsed)
                        .await;
                }
            }));
        }
        for task in tasks {
            task.await.expect("reporter task panicked");
        }

        let events = collector.finish().await;
        assert_eq!(events.len(), 200);
        assert!(events.iter().all(|event| event.stage_name == "Ramp"
            || event.stage_name == "Hold"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn halt_freezes_the_log_with_live_reporters() {
        let collector = EventCollector::spawn(two_stage_shape());
        let reporter = collector.reporter();
        reporter
            .report(RequestOutcome::success(42.0, 512), 1.0)
            .await;

        // `reporter` is still alive; halt must not wait for it.
        let events = collector.halt().await;
        assert!(events.len() <= 1);

        // Reporting after the halt is a no-op rather than an error.
        reporter
            .report(RequestOutcome::success(42.0, 512), 2.0)
            .await;
    }
}
