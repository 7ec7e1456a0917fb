// ABOUTME: In-memory split-time and result-list repositories backed by DashMap
// ABOUTME: Used for embedding the service without a database and by the integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{ResultListRepository, SplitTimeRepository};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use dashmap::DashMap;
use orienteering_core::models::{ResultListAggregate, ResultListId, RunnerSplitRecord};
use std::sync::Arc;

/// Split records keyed by result list
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySplitTimeRepository {
    splits: Arc<DashMap<ResultListId, Vec<RunnerSplitRecord>>>,
}

impl InMemorySplitTimeRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the split records of a result list
    pub fn insert(&self, result_list_id: ResultListId, records: Vec<RunnerSplitRecord>) {
        self.splits.insert(result_list_id, records);
    }

    /// Append one runner's split record to a result list
    pub fn push(&self, result_list_id: ResultListId, record: RunnerSplitRecord) {
        self.splits.entry(result_list_id).or_default().push(record);
    }
}

#[async_trait]
impl SplitTimeRepository for InMemorySplitTimeRepository {
    async fn find_splits_by_result_list(
        &self,
        result_list_id: ResultListId,
    ) -> AppResult<Vec<RunnerSplitRecord>> {
        Ok(self
            .splits
            .get(&result_list_id)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }
}

/// Result lists keyed by id
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultListRepository {
    result_lists: Arc<DashMap<ResultListId, ResultListAggregate>>,
}

impl InMemoryResultListRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result list, replacing any list with the same id
    pub fn insert(&self, result_list: ResultListAggregate) {
        self.result_lists
            .insert(result_list.result_list_id, result_list);
    }
}

#[async_trait]
impl ResultListRepository for InMemoryResultListRepository {
    async fn find_result_list(
        &self,
        result_list_id: ResultListId,
    ) -> AppResult<ResultListAggregate> {
        self.result_lists
            .get(&result_list_id)
            .map(|result_list| result_list.value().clone())
            .ok_or_else(|| {
                AppError::not_found(format!("Result list {result_list_id}"))
                    .with_resource_id(result_list_id.to_string())
            })
    }
}
