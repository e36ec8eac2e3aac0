// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Declarative stage tables and the tick controller polled by the scheduler.
//!
//! A [`StagePlan`] is an ordered, contiguous sequence of stages: stage `i+1`
//! becomes active at the instant stage `i`'s cumulative duration elapses.
//! The plan is immutable for the lifetime of one test run and is shared by
//! reference into every task that needs it — never through process-wide
//! mutable state.

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{ElapsedSeconds, errors::ConfigurationError};

/// One declared phase of a capacity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Human-readable label, unique within one plan.
    pub name: String,
    /// Desired concurrency by the end of this stage.
    pub target_users: u32,
    /// Users added per second while ramping toward `target_users`.
    pub spawn_rate: f64,
    /// Length of this stage, measured from when it becomes active.
    pub duration_seconds: f64,
}

impl StageSpec {
    /// Creates a stage specification.
    pub fn new(
        name: impl Into<String>,
        target_users: u32,
        spawn_rate: f64,
        duration_seconds: f64,
    ) -> Self {
        Self {
            name: name.into(),
            target_users,
            spawn_rate,
            duration_seconds,
        }
    }
}

/// The validated, ordered stage table of one test run.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    stages: Vec<StageSpec>,
    // End boundary of each stage as cumulative elapsed seconds.
    cumulative_ends: Vec<f64>,
}

impl StagePlan {
    /// Validates and freezes a stage table.
    ///
    /// Every `duration_seconds` and `spawn_rate` must be strictly positive
    /// and stage names must be unique within the plan.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self, ConfigurationError> {
        if stages.is_empty() {
            return Err(ConfigurationError::EmptyPlan);
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if !stage.duration_seconds.is_finite() || stage.duration_seconds <= 0.0 {
                return Err(ConfigurationError::NonPositiveDuration {
                    name: stage.name.clone(),
                    value: stage.duration_seconds,
                });
            }
            if !stage.spawn_rate.is_finite() || stage.spawn_rate <= 0.0 {
                return Err(ConfigurationError::NonPositiveSpawnRate {
                    name: stage.name.clone(),
                    value: stage.spawn_rate,
                });
            }
            if !seen.insert(stage.name.clone()) {
                return Err(ConfigurationError::DuplicateStageName {
                    name: stage.name.clone(),
                });
            }
        }

        let mut cumulative_ends = Vec::with_capacity(stages.len());
        let mut elapsed = 0.0;
        for stage in &stages {
            elapsed += stage.duration_seconds;
            cumulative_ends.push(elapsed);
        }

        Ok(Self {
            stages,
            cumulative_ends,
        })
    }

    /// The declared stages, in order.
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Number of declared stages; always at least one.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// A validated plan is never empty; present to satisfy the usual pair.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Elapsed seconds at which the stage with the given index becomes
    /// active: the sum of all prior stage durations.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn cumulative_start(&self, index: usize) -> ElapsedSeconds {
        if index == 0 {
            0.0
        } else {
            self.cumulative_ends[index - 1]
        }
    }

    /// Total declared duration of the run.
    pub fn total_duration(&self) -> ElapsedSeconds {
        *self
            .cumulative_ends
            .last()
            .expect("a validated plan has at least one stage")
    }

    /// Index of the stage active at the given elapsed time, or `None` once
    /// the run is over.
    ///
    /// Stage intervals are half open: an instant exactly on a boundary
    /// belongs to the later stage.
    pub fn stage_index_at(&self, elapsed_seconds: ElapsedSeconds) -> Option<usize> {
        let elapsed = elapsed_seconds.max(0.0);
        let index = self
            .cumulative_ends
            .partition_point(|end| *end <= elapsed);
        (index < self.stages.len()).then_some(index)
    }

    /// The stage active at the given elapsed time, or `None` once the run
    /// is over.
    pub fn stage_at(&self, elapsed_seconds: ElapsedSeconds) -> Option<&StageSpec> {
        self.stage_index_at(elapsed_seconds)
            .map(|index| &self.stages[index])
    }
}

/// One scheduling instruction returned by [`LoadShape::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Keep driving load toward the given concurrency.
    Active {
        /// Concurrency the scheduler should steer toward.
        target_users: u32,
        /// Users to add per second while below the target.
        spawn_rate: f64,
    },
    /// The declared stages are exhausted; stop spawning and tear down.
    Finished,
}

/// Stateless controller mapping elapsed test time to a scheduling
/// instruction.
///
/// The external scheduler may poll at irregular intervals; `tick` is a pure
/// function of its argument, so stage assignment can never drift between
/// polls.
#[derive(Debug, Clone)]
pub struct LoadShape {
    plan: Arc<StagePlan>,
}

impl LoadShape {
    /// Creates a controller over a validated plan.
    pub fn new(plan: Arc<StagePlan>) -> Self {
        Self { plan }
    }

    /// The plan this controller serves.
    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Scheduling instruction for the given elapsed time.
    pub fn tick(&self, elapsed_seconds: ElapsedSeconds) -> Tick {
        match self.plan.stage_at(elapsed_seconds) {
            Some(stage) => Tick::Active {
                target_users: stage.target_users,
                spawn_rate: stage.spawn_rate,
            },
            None => Tick::Finished,
        }
    }

    /// Name of the stage active at the given elapsed time, or `None` once
    /// the run is over.
    pub fn stage_name_at(&self, elapsed_seconds: ElapsedSeconds) -> Option<&str> {
        self.plan
            .stage_at(elapsed_seconds)
            .map(|stage| stage.name.as_str())
    }
}

impl From<StagePlan> for LoadShape {
    fn from(plan: StagePlan) -> Self {
        Self::new(Arc::new(plan))
    }
}
