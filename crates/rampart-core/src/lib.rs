// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core data model and load-shape control for Rampart capacity tests.
//!
//! A capacity test is declared as an ordered table of [`shape::StageSpec`]s.
//! The external virtual-user scheduler polls [`shape::LoadShape::tick`] to
//! learn the target concurrency for the current instant; every completed
//! request becomes an [`event::RequestEvent`] attributed to the stage active
//! at completion time.

pub mod errors;

pub mod event;

/// Stage tables and the tick controller driving the virtual-user scheduler.
pub mod shape;

/// Named, data-driven stage-table presets.
pub mod presets;

/// Elapsed run time, in seconds from the start of the test.
pub type ElapsedSeconds = f64;
