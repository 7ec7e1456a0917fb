// ABOUTME: Service layer exposing the split-time analyses over stored result lists
// ABOUTME: Resolves optional collaborators and runs the pure analysis core off the async runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Analysis service layer

/// Anomaly, cheating, hanging and mental resilience analyses
pub mod analysis;

pub use analysis::AnalysisService;
