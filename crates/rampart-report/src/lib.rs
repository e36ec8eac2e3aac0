// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event recording, per-stage aggregation, and capacity reporting.
//!
//! Virtual-user tasks feed completed-request outcomes into a
//! [`recorder::EventRecorder`] (or the channel-backed
//! [`recorder::EventCollector`]), which attributes each one to the stage
//! active at its completion time. Once the run ends, [`aggregate`] reduces
//! the frozen log into per-stage and overall statistics, [`classify`]
//! labels every stage and locates the breaking point, and [`report`]
//! assembles the final [`report::CapacityReport`].

pub mod aggregate;
pub mod classify;
pub mod recorder;
pub mod report;
