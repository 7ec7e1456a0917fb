// ABOUTME: Split-time intelligence engine for orienteering result lists
// ABOUTME: Segment building, reference times, Winsplits baselines and the four race analyzers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Orienteering Intelligence
//!
//! Pure, synchronous analysis over a frozen [`RaceData`] snapshot. Every
//! analyzer borrows one [`AnalysisPolicy`], builds its read-only lookups once
//! and maps runners in parallel.
//!
//! ## Modules
//!
//! - **segments**: punches to control-to-control legs
//! - **reference_times**: class and cross-class pools, self-exclusion
//! - **performance**: PI and the Winsplits Normal PI
//! - **anomaly** / **cheating**: course-cutting classifiers
//! - **hanging**: drafting detection with iterative baseline refinement
//! - **mental_resilience**: reaction after navigation mistakes

/// Analysis policy with env overrides and validation
pub mod config;

/// Small statistics helpers
pub mod statistics;

/// Segment builder
pub mod segments;

/// Race snapshot and person filter
pub mod race;

/// Reference-time estimator
pub mod reference_times;

/// Performance index and baseline engine
pub mod performance;

/// Analysis envelope, analyzer trait and cancellation
pub mod analysis;

/// Shared anomaly and cheating output types
pub mod suspicion;

/// Robust anomaly classifier
pub mod anomaly;

/// Flat-threshold cheating classifier
pub mod cheating;

/// Hanging (drafting) detector
pub mod hanging;

/// Mental resilience analyzer
pub mod mental_resilience;

pub use analysis::{Analysis, AnalysisKind, CancellationToken, ClassContext, RaceAnalyzer};
pub use anomaly::AnomalyAnalyzer;
pub use cheating::CheatingAnalyzer;
pub use config::{AnalysisPolicy, ConfigError};
pub use hanging::{
    HangingAnalyzer, HangingClassification, HangingPair, HangingProfile, HangingStatistics,
};
pub use mental_resilience::{
    MentalResilienceAnalyzer, MentalResilienceProfile, MentalResilienceStatistics,
    MistakeReactionPair, ResilienceClassification,
};
pub use race::{PersonFilter, RaceData, RunnerRace};
pub use suspicion::{
    PoolSource, ReferenceMethod, SuspicionLevel, SuspicionProfile, SuspicionStatistics,
    SuspiciousSegment,
};
