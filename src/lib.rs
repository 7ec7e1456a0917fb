// ABOUTME: Main library entry point for orienteering split-time analysis
// ABOUTME: Provides the analysis service, collaborator interfaces and logging setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Orienteering Analysis
//!
//! Split-time analysis over stored orienteering result lists. Given every
//! runner's punches and the result list's runtimes and start times, the
//! service detects course cutting, drafting ("hanging") and the runner's
//! reaction after navigation mistakes.
//!
//! ## Features
//!
//! - **Anomaly analysis**: robust self-excluded references with length-aware thresholds
//! - **Cheating analysis**: class-only references with flat thresholds
//! - **Hanging analysis**: cross-class driver detection with iterative baselines
//! - **Mental resilience**: panic, ice man and resigner reactions after mistakes
//!
//! ## Architecture
//!
//! - **orienteering-core**: identifiers, split and result models, errors, defaults
//! - **orienteering-intelligence**: the pure analysis engine and its policy
//! - this crate: repositories, the async service and logging
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orienteering_analysis::errors::AppResult;
//! use orienteering_analysis::repositories::{
//!     InMemoryResultListRepository, InMemorySplitTimeRepository, SplitTimeRepository,
//! };
//! use orienteering_analysis::services::AnalysisService;
//! use orienteering_analysis::{AnalysisPolicy, PersonFilter, ResultListId};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let result_lists = Arc::new(InMemoryResultListRepository::new());
//!     let splits: Arc<dyn SplitTimeRepository> = Arc::new(InMemorySplitTimeRepository::new());
//!     let service = AnalysisService::new(result_lists, Some(splits), AnalysisPolicy::default());
//!
//!     let analysis = service
//!         .analyze_hanging(ResultListId(1), &PersonFilter::all())
//!         .await?;
//!     println!("{} runners analyzed", analysis.runner_profiles.len());
//!     Ok(())
//! }
//! ```

/// Unified error handling
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// Split-time and result-list collaborator interfaces
pub mod repositories;

/// Analysis service
pub mod services;

pub use orienteering_core::models::{
    ClassResult, ControlPoint, EventId, PersonId, PersonRaceResult, PersonResult, Punch,
    ResultListAggregate, ResultListId, RunnerSplitRecord,
};
pub use orienteering_intelligence::{
    Analysis, AnalysisKind, AnalysisPolicy, AnomalyAnalyzer, CancellationToken, CheatingAnalyzer,
    HangingAnalyzer, HangingClassification, HangingProfile, HangingStatistics,
    MentalResilienceAnalyzer, MentalResilienceProfile, MentalResilienceStatistics, PersonFilter,
    RaceAnalyzer, RaceData, ResilienceClassification, SuspicionLevel, SuspicionProfile,
    SuspicionStatistics,
};
