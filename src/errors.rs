// ABOUTME: Error types of the analysis service, shared with the core and intelligence crates
// ABOUTME: Re-exports AppError/ErrorCode so callers depend on a single error surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! The service surfaces `AppError` from `orienteering-core` for every failure:
//! unknown result lists (`ResourceNotFound`), collaborator failures
//! (`ExternalServiceError`), invalid policies (`ConfigInvalid`) and
//! cancelled analyses (`AnalysisCancelled`). Runners without enough data are
//! never an error; they are left out of the analysis output.

pub use orienteering_core::errors::{AppError, AppResult, ErrorCode, ErrorContext};
pub use orienteering_intelligence::config::ConfigError;
