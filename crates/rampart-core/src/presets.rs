// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Named stage-table presets.
//!
//! Alternative shapes are selected by a configuration key, not by editing
//! source: every preset is plain data fed through the same [`StagePlan`]
//! validation as user-supplied tables.

use core::fmt;
use std::str::FromStr;

use crate::shape::{StagePlan, StageSpec};

/// Selects one of the built-in stage tables.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ShapePreset {
    /// Nine stages from warm-up through breaking point to cool-down;
    /// roughly 17 minutes. The default for normal capacity testing.
    #[default]
    Comprehensive,
    /// Very slow ramp for servers already known to struggle; pinpoints the
    /// exact breaking point. Roughly 12 minutes.
    Conservative,
    /// Rapid ramp to find the limits quickly. Roughly 10 minutes.
    Aggressive,
}

impl ShapePreset {
    /// Builds the preset's stage table.
    pub fn plan(self) -> StagePlan {
        let stages = match self {
            ShapePreset::Comprehensive => vec![
                StageSpec::new("Warm-up", 5, 1.0, 120.0),
                StageSpec::new("Baseline", 5, 1.0, 120.0),
                StageSpec::new("Light Stress", 10, 1.0, 120.0),
                StageSpec::new("Medium Load Hold", 10, 1.0, 120.0),
                StageSpec::new("Heavy Stress", 20, 2.0, 120.0),
                StageSpec::new("Peak Load Hold", 20, 2.0, 120.0),
                StageSpec::new("Breaking Point", 30, 2.0, 120.0),
                StageSpec::new("Failure Observation", 30, 2.0, 120.0),
                StageSpec::new("Cool Down", 5, 3.0, 60.0),
            ],
            ShapePreset::Conservative => vec![
                StageSpec::new("2 Users Ramp", 2, 1.0, 60.0),
                StageSpec::new("2 Users Hold", 2, 1.0, 120.0),
                StageSpec::new("3 Users Ramp", 3, 1.0, 60.0),
                StageSpec::new("3 Users Hold", 3, 1.0, 120.0),
                StageSpec::new("5 Users Ramp", 5, 1.0, 60.0),
                StageSpec::new("5 Users Hold", 5, 1.0, 120.0),
                StageSpec::new("8 Users Ramp", 8, 1.0, 60.0),
                StageSpec::new("8 Users Hold", 8, 1.0, 120.0),
            ],
            ShapePreset::Aggressive => vec![
                StageSpec::new("Quick Start", 5, 2.0, 60.0),
                StageSpec::new("Quick Start Hold", 5, 2.0, 90.0),
                StageSpec::new("Rapid Ramp", 15, 3.0, 60.0),
                StageSpec::new("Rapid Hold", 15, 3.0, 90.0),
                StageSpec::new("Heavy Push", 30, 5.0, 60.0),
                StageSpec::new("Heavy Hold", 30, 5.0, 90.0),
                StageSpec::new("Breaking Point", 50, 10.0, 60.0),
                StageSpec::new("Observation", 50, 10.0, 90.0),
            ],
        };
        StagePlan::new(stages).expect("preset stage tables are statically valid")
    }
}

impl FromStr for ShapePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comprehensive" => Ok(Self::Comprehensive),
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(format!("unrecognised shape preset: {s}")),
        }
    }
}

impl fmt::Display for ShapePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapePreset::Comprehensive => f.write_str("comprehensive"),
            ShapePreset::Conservative => f.write_str("conservative"),
            ShapePreset::Aggressive => f.write_str("aggressive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_builds_a_valid_plan() {
        for preset in [
            ShapePreset::Comprehensive,
            ShapePreset::Conservative,
            ShapePreset::Aggressive,
        ] {
            let plan = preset.plan();
            assert!(plan.len() >= 8, "{preset} has too few stages");
        }
    }

    #[test]
    fn preset_total_durations_match_the_documented_runtimes() {
        assert_eq!(ShapePreset::Comprehensive.plan().total_duration(), 1020.0);
        assert_eq!(ShapePreset::Conservative.plan().total_duration(), 720.0);
        assert_eq!(ShapePreset::Aggressive.plan().total_duration(), 600.0);
    }

    #[test]
    fn preset_keys_round_trip() {
        for preset in [
            ShapePreset::Comprehensive,
            ShapePreset::Conservative,
            ShapePreset::Aggressive,
        ] {
            let parsed: ShapePreset = preset.to_string().parse().expect("key parses");
            assert_eq!(parsed, preset);
        }
        assert!("turbo".parse::<ShapePreset>().is_err());
    }

    #[test]
    fn comprehensive_peaks_at_thirty_users() {
        let plan = ShapePreset::Comprehensive.plan();
        let peak = plan
            .stages()
            .iter()
            .map(|stage| stage.target_users)
            .max()
            .expect("plan is non-empty");
        assert_eq!(peak, 30);
    }
}
