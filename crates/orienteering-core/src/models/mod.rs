// ABOUTME: Core data models for orienteering split analysis
// ABOUTME: Re-exports identifiers, control points, split records and result-list aggregates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Inputs to the analysis core. All of them are immutable once loaded from
//! the collaborator stores; the analyzers derive everything else.
//!
//! - `RunnerSplitRecord`: one runner's ordered punches for one race
//! - `ResultListAggregate`: per-class, per-person race results with runtimes
//! - `ControlPoint`: a real control or the virtual start/finish

mod ids;
mod result_list;
mod splits;

pub use ids::{EventId, PersonId, ResultListId};
pub use result_list::{ClassResult, PersonRaceResult, PersonResult, ResultListAggregate};
pub use splits::{ControlPoint, Punch, RunnerSplitRecord};
