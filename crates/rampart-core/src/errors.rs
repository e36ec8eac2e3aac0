// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while validating a capacity-test configuration.

/// Error returned when a stage table or classifier configuration is invalid.
///
/// Configuration is validated at construction, before any virtual users are
/// scheduled; these errors are non-recoverable and surfaced to the operator.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The stage table contains no stages.
    #[error("a load shape requires at least one stage")]
    EmptyPlan,
    /// A stage declares a non-positive duration.
    #[error("stage {name:?}: duration_seconds must be strictly positive (got {value})")]
    NonPositiveDuration {
        /// Name of the offending stage.
        name: String,
        /// The rejected duration value.
        value: f64,
    },
    /// A stage declares a non-positive spawn rate.
    #[error("stage {name:?}: spawn_rate must be strictly positive (got {value})")]
    NonPositiveSpawnRate {
        /// Name of the offending stage.
        name: String,
        /// The rejected spawn-rate value.
        value: f64,
    },
    /// Two stages in the same table share a name.
    #[error("stage name {name:?} is declared more than once")]
    DuplicateStageName {
        /// The repeated name.
        name: String,
    },
    /// A classifier threshold lies outside its permitted range.
    #[error("classifier threshold {field} must lie within {range} (got {value})")]
    ThresholdOutOfRange {
        /// Name of the threshold field.
        field: &'static str,
        /// Human-readable permitted range.
        range: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A healthy bound is not below its corresponding failed bound.
    #[error("healthy bound for {field} must be below the failed bound ({healthy} >= {failed})")]
    InvertedThresholds {
        /// Name of the threshold field.
        field: &'static str,
        /// The configured healthy bound.
        healthy: f64,
        /// The configured failed bound.
        failed: f64,
    },
}
