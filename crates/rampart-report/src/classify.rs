// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Threshold-based capacity classification.
//!
//! Each stage summary is labeled healthy, degraded, or failed. The three
//! bands are mutually exclusive and exhaustive over the
//! `(error_rate, p95_latency)` plane: failed is evaluated first, then
//! healthy, and everything else is degraded, so a stage failing on errors
//! alone is failed even when its latency looks acceptable.

use rampart_core::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

use crate::aggregate::StageSummary;

/// Health label of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Error rate and p95 latency both below the healthy bounds.
    Healthy,
    /// Neither healthy nor failed.
    Degraded,
    /// Error rate or p95 latency beyond the failed bounds.
    Failed,
}

/// Classification bounds and the capacity safety factor.
///
/// Error rates are fractions in `[0, 1]`; latencies are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// A stage is healthy only while its error rate is below this bound.
    pub healthy_max_error_rate: f64,
    /// A stage is healthy only while its p95 latency is below this bound.
    pub healthy_max_p95_latency_ms: f64,
    /// A stage is failed once its error rate exceeds this bound.
    pub failed_min_error_rate: f64,
    /// A stage is failed once its p95 latency exceeds this bound.
    pub failed_min_p95_latency_ms: f64,
    /// Fraction of the highest healthy concurrency recommended for
    /// production.
    pub safety_factor: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            healthy_max_error_rate: 0.01,
            healthy_max_p95_latency_ms: 5_000.0,
            failed_min_error_rate: 0.10,
            failed_min_p95_latency_ms: 15_000.0,
            safety_factor: 0.7,
        }
    }
}

impl ClassifierThresholds {
    /// Validates the threshold configuration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("healthy_max_error_rate", self.healthy_max_error_rate),
            ("failed_min_error_rate", self.failed_min_error_rate),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ThresholdOutOfRange {
                    field,
                    range: "[0, 1]",
                    value,
                });
            }
        }
        for (field, value) in [
            (
                "healthy_max_p95_latency_ms",
                self.healthy_max_p95_latency_ms,
            ),
            ("failed_min_p95_latency_ms", self.failed_min_p95_latency_ms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::ThresholdOutOfRange {
                    field,
                    range: "(0, +inf)",
                    value,
                });
            }
        }
        if !self.safety_factor.is_finite() || !(0.0..=1.0).contains(&self.safety_factor)
            || self.safety_factor == 0.0
        {
            return Err(ConfigurationError::ThresholdOutOfRange {
                field: "safety_factor",
                range: "(0, 1]",
                value: self.safety_factor,
            });
        }
        if self.healthy_max_error_rate >= self.failed_min_error_rate {
            return Err(ConfigurationError::InvertedThresholds {
                field: "error_rate",
                healthy: self.healthy_max_error_rate,
                failed: self.failed_min_error_rate,
            });
        }
        if self.healthy_max_p95_latency_ms >= self.failed_min_p95_latency_ms {
            return Err(ConfigurationError::InvertedThresholds {
                field: "p95_latency_ms",
                healthy: self.healthy_max_p95_latency_ms,
                failed: self.failed_min_p95_latency_ms,
            });
        }
        Ok(())
    }
}

/// Applies threshold rules to stage summaries.
#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: ClassifierThresholds,
}

impl Classifier {
    /// Creates a classifier over validated thresholds.
    pub fn new(thresholds: ClassifierThresholds) -> Result<Self, ConfigurationError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    /// The configured thresholds.
    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Labels one `(error_rate, p95_latency)` observation.
    ///
    /// `p95_latency_ms` is `None` for a stage without a latency sample;
    /// such a stage cannot demonstrate health and is degraded unless its
    /// error rate alone fails it.
    pub fn classify(&self, error_rate: f64, p95_latency_ms: Option<f64>) -> Classification {
        let failed = error_rate > self.thresholds.failed_min_error_rate
            || p95_latency_ms.is_some_and(|p95| p95 > self.thresholds.failed_min_p95_latency_ms);
        if failed {
            return Classification::Failed;
        }
        let healthy = error_rate < self.thresholds.healthy_max_error_rate
            && p95_latency_ms.is_some_and(|p95| p95 < self.thresholds.healthy_max_p95_latency_ms);
        if healthy {
            Classification::Healthy
        } else {
            Classification::Degraded
        }
    }

    /// Finds the breaking point and the capacity recommendation across the
    /// declared stages.
    pub fn analyze(&self, summaries: &[StageSummary]) -> CapacityAnalysis {
        let mut analysis = CapacityAnalysis {
            healthy_stages: Vec::new(),
            degraded_stages: Vec::new(),
            failed_stages: Vec::new(),
            breaking_point: None,
            max_healthy_capacity: 0,
            recommended_capacity: 0,
        };

        for summary in summaries {
            match summary.classification {
                Classification::Healthy => {
                    analysis.healthy_stages.push(summary.name.clone());
                    analysis.max_healthy_capacity =
                        analysis.max_healthy_capacity.max(summary.target_users);
                }
                Classification::Degraded => {
                    analysis.degraded_stages.push(summary.name.clone());
                }
                Classification::Failed => {
                    analysis.failed_stages.push(summary.name.clone());
                    if analysis.breaking_point.is_none() {
                        analysis.breaking_point = Some(summary.name.clone());
                    }
                }
            }
        }

        // max_healthy_capacity of 0 means "no safe capacity found"; the
        // recommendation must then stay 0 as well.
        analysis.recommended_capacity =
            (f64::from(analysis.max_healthy_capacity) * self.thresholds.safety_factor).floor()
                as u32;

        tracing::info!(
            breaking_point = ?analysis.breaking_point,
            max_healthy_capacity = analysis.max_healthy_capacity,
            recommended_capacity = analysis.recommended_capacity,
            "capacity analysis complete"
        );
        analysis
    }
}

/// Outcome of classifying every declared stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAnalysis {
    /// Names of healthy stages, in declared order.
    pub healthy_stages: Vec<String>,
    /// Names of degraded stages, in declared order.
    pub degraded_stages: Vec<String>,
    /// Names of failed stages, in declared order.
    pub failed_stages: Vec<String>,
    /// First declared stage classified failed, absent when none failed.
    pub breaking_point: Option<String>,
    /// Largest target concurrency among healthy stages; 0 when no stage
    /// was healthy.
    pub max_healthy_capacity: u32,
    /// `floor(max_healthy_capacity * safety_factor)`.
    pub recommended_capacity: u32,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(ClassifierThresholds::default()).expect("defaults are valid")
    }

    #[rstest]
    // error_rate = 0%
    #[case(0.0, 0.0, Classification::Healthy)]
    #[case(0.0, 5_000.0, Classification::Degraded)]
    #[case(0.0, 15_000.0, Classification::Degraded)]
    #[case(0.0, 100_000.0, Classification::Failed)]
    // error_rate = 1% (healthy bound is exclusive)
    #[case(0.01, 0.0, Classification::Degraded)]
    #[case(0.01, 5_000.0, Classification::Degraded)]
    #[case(0.01, 15_000.0, Classification::Degraded)]
    #[case(0.01, 100_000.0, Classification::Failed)]
    // error_rate = 10% (failed bound is exclusive)
    #[case(0.10, 0.0, Classification::Degraded)]
    #[case(0.10, 5_000.0, Classification::Degraded)]
    #[case(0.10, 15_000.0, Classification::Degraded)]
    #[case(0.10, 100_000.0, Classification::Failed)]
    // error_rate = 100%: failed regardless of latency (tie-break rule)
    #[case(1.0, 0.0, Classification::Failed)]
    #[case(1.0, 5_000.0, Classification::Failed)]
    #[case(1.0, 15_000.0, Classification::Failed)]
    #[case(1.0, 100_000.0, Classification::Failed)]
    fn bands_are_exhaustive_and_exclusive(
        #[case] error_rate: f64,
        #[case] p95_latency_ms: f64,
        #[case] expected: Classification,
    ) {
        assert_eq!(
            classifier().classify(error_rate, Some(p95_latency_ms)),
            expected
        );
    }

    #[test]
    fn high_error_rate_with_low_latency_is_failed_not_degraded() {
        assert_eq!(
            classifier().classify(0.15, Some(120.0)),
            Classification::Failed
        );
    }

    #[test]
    fn missing_latency_sample_is_degraded_unless_errors_fail_it() {
        assert_eq!(classifier().classify(0.0, None), Classification::Degraded);
        assert_eq!(classifier().classify(0.5, None), Classification::Failed);
    }

    #[test]
    fn rejects_inverted_error_rate_bounds() {
        let thresholds = ClassifierThresholds {
            healthy_max_error_rate: 0.2,
            failed_min_error_rate: 0.1,
            ..ClassifierThresholds::default()
        };
        assert_eq!(
            thresholds.validate().unwrap_err(),
            ConfigurationError::InvertedThresholds {
                field: "error_rate",
                healthy: 0.2,
                failed: 0.1,
            }
        );
    }

    #[test]
    fn rejects_out_of_range_safety_factor() {
        let thresholds = ClassifierThresholds {
            safety_factor: 0.0,
            ..ClassifierThresholds::default()
        };
        assert!(matches!(
            thresholds.validate().unwrap_err(),
            ConfigurationError::ThresholdOutOfRange {
                field: "safety_factor",
                ..
            }
        ));
    }

    #[test]
    fn looser_service_specific_bands_are_configurable() {
        // Compute-heavy services such as speaker diarization warrant
        // looser bands than the defaults.
        let classifier = Classifier::new(ClassifierThresholds {
            healthy_max_error_rate: 0.05,
            healthy_max_p95_latency_ms: 30_000.0,
            failed_min_error_rate: 0.10,
            failed_min_p95_latency_ms: 60_000.0,
            safety_factor: 0.8,
        })
        .expect("thresholds are valid");
        assert_eq!(
            classifier.classify(0.03, Some(25_000.0)),
            Classification::Healthy
        );
    }
}
