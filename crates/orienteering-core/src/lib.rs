// ABOUTME: Core types and constants for orienteering split-time analysis
// ABOUTME: Foundation crate with error handling, identifiers, split/result models, and policy constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Orienteering Core
//!
//! Foundation crate providing shared types and constants for the split-time
//! analysis workspace. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Default analysis policy values organized by analyzer
//! - **models**: Identifiers, control points, punches and result-list aggregates

/// Unified error handling system with standard error codes
pub mod errors;

/// Default policy values organized by analyzer
pub mod constants;

/// Core data models (splits, result lists, identifiers)
pub mod models;
