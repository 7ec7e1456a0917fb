// ABOUTME: Read-only collaborator interfaces supplying split times and result lists
// ABOUTME: The analysis core never performs I/O itself; everything is fetched through these traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Repository interfaces
//!
//! Implementations are expected to be cheap to share (`Arc`) and safe to call
//! concurrently from several analyses.

/// `DashMap`-backed repositories for embedding and tests
pub mod in_memory;

pub use in_memory::{InMemoryResultListRepository, InMemorySplitTimeRepository};

use crate::errors::AppResult;
use async_trait::async_trait;
use orienteering_core::models::{ResultListAggregate, ResultListId, RunnerSplitRecord};

/// Source of every runner's punches for a result list
#[async_trait]
pub trait SplitTimeRepository: Send + Sync {
    /// Every runner's ordered punches for the result list
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying store fails
    async fn find_splits_by_result_list(
        &self,
        result_list_id: ResultListId,
    ) -> AppResult<Vec<RunnerSplitRecord>>;
}

/// Source of result lists with runtimes and start times
#[async_trait]
pub trait ResultListRepository: Send + Sync {
    /// The result list with its class results
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the id is unknown
    async fn find_result_list(&self, result_list_id: ResultListId)
        -> AppResult<ResultListAggregate>;
}
