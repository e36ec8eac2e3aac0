// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Completed-request records produced by the request-execution collaborator.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ElapsedSeconds;

/// Classification tag for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request did not complete before the client-side deadline.
    Timeout,
    /// The transport failed before any response was received.
    Transport,
    /// The endpoint answered with a non-success HTTP status.
    Http(u16),
    /// A response arrived but failed payload validation.
    Validation,
}

impl ErrorKind {
    /// Stable label used as the key of error-distribution maps.
    pub fn label(&self) -> String {
        match self {
            ErrorKind::Timeout => "TIMEOUT".to_owned(),
            ErrorKind::Transport => "TRANSPORT".to_owned(),
            ErrorKind::Http(status) => format!("HTTP_{status}"),
            ErrorKind::Validation => "VALIDATION".to_owned(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One completed request/response cycle, before stage attribution.
///
/// Produced by the external request-execution collaborator; failures are
/// data, never control flow. A failure that never received a response
/// carries no measured latency and is excluded from latency samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Latency of the request in milliseconds, when measured.
    pub elapsed_ms: Option<f64>,
    /// Whether the request succeeded (transport and validation).
    pub success: bool,
    /// Failure classification; present only when `success` is false.
    pub error_kind: Option<ErrorKind>,
    /// Response payload size in bytes, when known.
    pub response_bytes: Option<u64>,
}

impl RequestOutcome {
    /// A successful request with a measured latency and known payload size.
    pub fn success(elapsed_ms: f64, response_bytes: u64) -> Self {
        Self {
            elapsed_ms: Some(elapsed_ms),
            success: true,
            error_kind: None,
            response_bytes: Some(response_bytes),
        }
    }

    /// A failed request.
    ///
    /// `elapsed_ms` is `None` when the failure precluded a latency
    /// measurement (e.g. a connection that never completed).
    pub fn failure(error_kind: ErrorKind, elapsed_ms: Option<f64>) -> Self {
        Self {
            elapsed_ms,
            success: false,
            error_kind: Some(error_kind),
            response_bytes: None,
        }
    }
}

/// A completed request attributed to the stage active at its completion.
///
/// Created once at ingestion time and never mutated; the event log holds
/// these until the final report is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// Completion time as elapsed run seconds; monotonic within a run.
    pub timestamp_seconds: ElapsedSeconds,
    /// Name of the stage active at the moment of completion.
    pub stage_name: String,
    /// Latency of the request in milliseconds, when measured.
    pub elapsed_ms: Option<f64>,
    /// Whether the request succeeded.
    pub success: bool,
    /// Failure classification; present only when `success` is false.
    pub error_kind: Option<ErrorKind>,
    /// Response payload size in bytes, when known.
    pub response_bytes: Option<u64>,
}

impl RequestEvent {
    /// Stamps an outcome with the stage active at its completion time.
    pub fn from_outcome(
        outcome: RequestOutcome,
        stage_name: impl Into<String>,
        timestamp_seconds: ElapsedSeconds,
    ) -> Self {
        Self {
            timestamp_seconds,
            stage_name: stage_name.into(),
            elapsed_ms: outcome.elapsed_ms,
            success: outcome.success,
            error_kind: outcome.error_kind,
            response_bytes: outcome.response_bytes,
        }
    }

    /// Latency to include in distribution samples.
    ///
    /// Failed requests contribute only when they carry a measurement.
    pub fn measured_latency(&self) -> Option<f64> {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_labels_match_report_keys() {
        assert_eq!(ErrorKind::Timeout.label(), "TIMEOUT");
        assert_eq!(ErrorKind::Transport.label(), "TRANSPORT");
        assert_eq!(ErrorKind::Http(502).label(), "HTTP_502");
        assert_eq!(ErrorKind::Validation.label(), "VALIDATION");
    }

    #[test]
    fn failure_without_measurement_has_no_latency_sample() {
        let outcome = RequestOutcome::failure(ErrorKind::Transport, None);
        let event = RequestEvent::from_outcome(outcome, "Baseline", 12.5);
        assert!(event.measured_latency().is_none());
        assert!(!event.success);
    }

    #[test]
    fn request_event_round_trips_through_json() {
        let event = RequestEvent::from_outcome(
            RequestOutcome::failure(ErrorKind::Http(429), Some(812.3)),
            "Heavy Stress",
            640.0,
        );
        let json = serde_json::to_string(&event).expect("event serializes");
        let back: RequestEvent = serde_json::from_str(&json).expect("event deserializes");
        assert_eq!(back, event);
    }
}
