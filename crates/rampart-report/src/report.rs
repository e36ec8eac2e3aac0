// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Assembly of the final capacity report.
//!
//! Pure composition: all numbers come from [`crate::aggregate`] and
//! [`crate::classify`]; this module only arranges them, echoes the test's
//! static configuration for traceability, and derives the operator-facing
//! recommendation strings.

use chrono::Utc;
use rampart_core::{
    event::RequestEvent,
    shape::{StagePlan, StageSpec},
};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{self, ErrorBreakdown, OverallStatistics, StageSummary},
    classify::{CapacityAnalysis, Classifier, ClassifierThresholds},
};

/// Static identity of the service under test, echoed into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestContext {
    /// Human-readable service name, e.g. "Speech Recognition".
    pub service_name: String,
    /// Deployment identifier of the model or service under test.
    pub service_id: String,
    /// Endpoint path the virtual users exercised.
    pub endpoint: String,
    /// Configuration key of the stage table in use.
    pub shape: String,
}

/// Test identity block of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInfo {
    /// Kind of test that produced this report.
    pub test_type: String,
    /// Human-readable service name.
    pub service: String,
    /// Deployment identifier of the service under test.
    pub service_id: String,
    /// Endpoint path the virtual users exercised.
    pub endpoint: String,
    /// Configuration key of the stage table in use.
    pub shape: String,
    /// RFC 3339 timestamp of report assembly.
    pub test_date: String,
    /// Declared duration of the full run.
    pub total_duration_seconds: f64,
}

/// Operator-facing conclusions derived from the capacity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Production concurrency statement.
    pub production_capacity: String,
    /// Whether the service needs scaling before production use.
    pub scaling_needed: bool,
    /// Ordered optimization hints.
    pub optimization_priority: Vec<String>,
    /// Concrete follow-up actions.
    pub action_items: Vec<String>,
}

/// The final aggregate result of one capacity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// Test identity echo.
    pub test_info: TestInfo,
    /// Unscoped statistics across the full event log.
    pub overall_statistics: OverallStatistics,
    /// Error-kind distribution across the full event log.
    pub error_analysis: ErrorBreakdown,
    /// One summary per declared stage, in declared order.
    pub stage_by_stage_metrics: Vec<StageSummary>,
    /// Breaking point and capacity conclusions.
    pub capacity_analysis: CapacityAnalysis,
    /// Operator-facing recommendations.
    pub recommendations: Recommendations,
    /// The declared stage table, echoed for traceability.
    pub stages: Vec<StageSpec>,
}

/// Composes the final report from a frozen event log.
///
/// Always succeeds: an empty or all-failed log still yields a complete
/// report.
pub fn assemble(
    context: &TestContext,
    plan: &StagePlan,
    classifier: &Classifier,
    events: &[RequestEvent],
) -> CapacityReport {
    let stage_by_stage_metrics = aggregate::per_stage(plan, events, classifier);
    let overall_statistics = aggregate::overall(plan, events);
    let error_analysis = aggregate::overall_errors(events);
    let capacity_analysis = classifier.analyze(&stage_by_stage_metrics);
    let recommendations = recommendations(
        &capacity_analysis,
        &stage_by_stage_metrics,
        classifier.thresholds(),
    );

    tracing::info!(
        service = %context.service_name,
        total_requests = overall_statistics.total_requests,
        error_rate = overall_statistics.error_rate,
        breaking_point = ?capacity_analysis.breaking_point,
        "assembled capacity report"
    );

    CapacityReport {
        test_info: TestInfo {
            test_type: "load_shaping".to_owned(),
            service: context.service_name.clone(),
            service_id: context.service_id.clone(),
            endpoint: context.endpoint.clone(),
            shape: context.shape.clone(),
            test_date: Utc::now().to_rfc3339(),
            total_duration_seconds: plan.total_duration(),
        },
        overall_statistics,
        error_analysis,
        stage_by_stage_metrics,
        capacity_analysis,
        recommendations,
        stages: plan.stages().to_vec(),
    }
}

fn recommendations(
    analysis: &CapacityAnalysis,
    summaries: &[StageSummary],
    thresholds: &ClassifierThresholds,
) -> Recommendations {
    let mut optimization_priority = Vec::new();
    let mut action_items = Vec::new();

    let production_capacity;
    let scaling_needed;
    if analysis.max_healthy_capacity > 0 {
        production_capacity = format!(
            "{} concurrent users ({:.0}% of the highest healthy stage: {})",
            analysis.recommended_capacity,
            thresholds.safety_factor * 100.0,
            analysis.max_healthy_capacity,
        );
        action_items.push(format!(
            "Cap production concurrency at {} users",
            analysis.recommended_capacity
        ));
        scaling_needed = false;
    } else {
        production_capacity =
            "No safe capacity found; the service degraded before any stage completed healthy"
                .to_owned();
        action_items
            .push("Investigate failures at the lowest tested load before rerunning".to_owned());
        scaling_needed = true;
    }

    if !analysis.failed_stages.is_empty() {
        optimization_priority.push(format!(
            "High error rates or latency in {} stage(s); inspect server logs",
            analysis.failed_stages.len()
        ));
    }
    for summary in summaries {
        if summary
            .latency_ms
            .p99
            .is_some_and(|p99| p99 > thresholds.failed_min_p95_latency_ms)
        {
            optimization_priority.push(format!(
                "P99 latency above {:.0} ms in stage {:?}; optimize response time",
                thresholds.failed_min_p95_latency_ms, summary.name
            ));
            break;
        }
    }
    if optimization_priority.is_empty() {
        optimization_priority.push("System performing well within the tested range".to_owned());
    }

    Recommendations {
        production_capacity,
        scaling_needed,
        optimization_priority,
        action_items,
    }
}

#[cfg(test)]
mod tests {
    use rampart_core::{
        event::{ErrorKind, RequestOutcome},
        shape::StageSpec,
    };

    use super::*;

    fn context() -> TestContext {
        TestContext {
            service_name: "Speech Recognition".to_owned(),
            service_id: "ai4bharat/indictasr".to_owned(),
            endpoint: "/services/inference/asr".to_owned(),
            shape: "comprehensive".to_owned(),
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(ClassifierThresholds::default()).expect("defaults are valid")
    }

    fn plan() -> StagePlan {
        StagePlan::new(vec![
            StageSpec::new("Warm-up", 5, 1.0, 60.0),
            StageSpec::new("Stress", 20, 2.0, 60.0),
        ])
        .expect("plan is valid")
    }

    #[test]
    fn empty_run_still_produces_a_report() {
        let report = assemble(&context(), &plan(), &classifier(), &[]);
        assert_eq!(report.overall_statistics.total_requests, 0);
        assert_eq!(report.stage_by_stage_metrics.len(), 2);
        assert_eq!(report.capacity_analysis.max_healthy_capacity, 0);
        assert_eq!(report.capacity_analysis.recommended_capacity, 0);
        assert!(report.recommendations.scaling_needed);
        assert_eq!(report.test_info.total_duration_seconds, 120.0);
        assert_eq!(report.stages.len(), 2);
    }

    #[test]
    fn healthy_run_recommends_seventy_percent_of_peak() {
        let events: Vec<_> = (0..120)
            .map(|i| {
                let elapsed = f64::from(i);
                RequestEvent::from_outcome(
                    RequestOutcome::success(250.0, 2048),
                    if elapsed < 60.0 { "Warm-up" } else { "Stress" },
                    elapsed,
                )
            })
            .collect();
        let report = assemble(&context(), &plan(), &classifier(), &events);
        assert_eq!(report.capacity_analysis.max_healthy_capacity, 20);
        assert_eq!(report.capacity_analysis.recommended_capacity, 14);
        assert!(!report.recommendations.scaling_needed);
        assert!(
            report
                .recommendations
                .production_capacity
                .starts_with("14 concurrent users")
        );
        assert_eq!(
            report.recommendations.action_items,
            vec!["Cap production concurrency at 14 users".to_owned()]
        );
    }

    #[test]
    fn all_failed_run_reports_the_first_stage_as_breaking_point() {
        let events: Vec<_> = (0..100)
            .map(|i| {
                let elapsed = f64::from(i) * 1.2;
                RequestEvent::from_outcome(
                    RequestOutcome::failure(ErrorKind::Http(500), Some(400.0)),
                    if elapsed < 60.0 { "Warm-up" } else { "Stress" },
                    elapsed,
                )
            })
            .collect();
        let report = assemble(&context(), &plan(), &classifier(), &events);
        assert_eq!(report.overall_statistics.error_rate, 1.0);
        assert_eq!(
            report.capacity_analysis.breaking_point.as_deref(),
            Some("Warm-up")
        );
        assert_eq!(report.capacity_analysis.recommended_capacity, 0);
        assert_eq!(report.error_analysis.distribution["HTTP_500"], 100);
    }
}
