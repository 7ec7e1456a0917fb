// ABOUTME: Analysis service resolving collaborators, fetching inputs once and running the analyzers
// ABOUTME: Every analysis runs on the blocking pool over a frozen race snapshot and can be cancelled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use crate::logging::AnalysisLogger;
use crate::repositories::{ResultListRepository, SplitTimeRepository};
use orienteering_core::models::ResultListId;
use orienteering_intelligence::anomaly::AnomalyAnalyzer;
use orienteering_intelligence::cheating::CheatingAnalyzer;
use orienteering_intelligence::hanging::{HangingAnalyzer, HangingProfile, HangingStatistics};
use orienteering_intelligence::mental_resilience::{
    MentalResilienceAnalyzer, MentalResilienceProfile, MentalResilienceStatistics,
};
use orienteering_intelligence::suspicion::{SuspicionProfile, SuspicionStatistics};
use orienteering_intelligence::{
    Analysis, AnalysisKind, AnalysisPolicy, CancellationToken, PersonFilter, RaceAnalyzer,
    RaceData,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument, Span};

/// Where split times come from
#[derive(Clone)]
enum SplitSource {
    /// A split-time store is configured
    Store(Arc<dyn SplitTimeRepository>),
    /// No store: every analysis is empty
    Unavailable,
}

/// Entry point for the four analyses over stored result lists
#[derive(Clone)]
pub struct AnalysisService {
    result_lists: Arc<dyn ResultListRepository>,
    splits: SplitSource,
    policy: Arc<AnalysisPolicy>,
}

impl AnalysisService {
    /// Create a service; without a split-time store every analysis is empty
    #[must_use]
    pub fn new(
        result_lists: Arc<dyn ResultListRepository>,
        split_times: Option<Arc<dyn SplitTimeRepository>>,
        policy: AnalysisPolicy,
    ) -> Self {
        Self {
            result_lists,
            splits: split_times.map_or(SplitSource::Unavailable, SplitSource::Store),
            policy: Arc::new(policy),
        }
    }

    /// Create a service using the process-wide policy
    #[must_use]
    pub fn with_global_policy(
        result_lists: Arc<dyn ResultListRepository>,
        split_times: Option<Arc<dyn SplitTimeRepository>>,
    ) -> Self {
        Self::new(result_lists, split_times, AnalysisPolicy::global().clone())
    }

    /// Policy the analyzers run with
    #[must_use]
    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    /// Robust course-cutting analysis
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown result list, or a collaborator error
    pub async fn analyze_anomalies(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
    ) -> AppResult<Analysis<SuspicionProfile, SuspicionStatistics>> {
        self.analyze_anomalies_cancellable(result_list_id, filter, CancellationToken::new())
            .await
    }

    /// Robust course-cutting analysis that stops when `cancel` is triggered
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze_anomalies`], plus `AnalysisCancelled`
    pub async fn analyze_anomalies_cancellable(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
        cancel: CancellationToken,
    ) -> AppResult<Analysis<SuspicionProfile, SuspicionStatistics>> {
        self.run(
            AnalysisKind::Anomaly,
            result_list_id,
            filter,
            cancel,
            |policy, race, filter, cancel| {
                AnomalyAnalyzer::new(policy).analyze(race, filter, cancel)
            },
        )
        .await
    }

    /// Flat-threshold course-cutting analysis
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown result list, or a collaborator error
    pub async fn analyze_cheating(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
    ) -> AppResult<Analysis<SuspicionProfile, SuspicionStatistics>> {
        self.analyze_cheating_cancellable(result_list_id, filter, CancellationToken::new())
            .await
    }

    /// Flat-threshold course-cutting analysis that stops when `cancel` is triggered
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze_cheating`], plus `AnalysisCancelled`
    pub async fn analyze_cheating_cancellable(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
        cancel: CancellationToken,
    ) -> AppResult<Analysis<SuspicionProfile, SuspicionStatistics>> {
        self.run(
            AnalysisKind::Cheating,
            result_list_id,
            filter,
            cancel,
            |policy, race, filter, cancel| {
                CheatingAnalyzer::new(policy).analyze(race, filter, cancel)
            },
        )
        .await
    }

    /// Drafting analysis
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown result list, or a collaborator error
    pub async fn analyze_hanging(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
    ) -> AppResult<Analysis<HangingProfile, HangingStatistics>> {
        self.analyze_hanging_cancellable(result_list_id, filter, CancellationToken::new())
            .await
    }

    /// Drafting analysis that stops when `cancel` is triggered
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze_hanging`], plus `AnalysisCancelled`
    pub async fn analyze_hanging_cancellable(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
        cancel: CancellationToken,
    ) -> AppResult<Analysis<HangingProfile, HangingStatistics>> {
        self.run(
            AnalysisKind::Hanging,
            result_list_id,
            filter,
            cancel,
            |policy, race, filter, cancel| {
                HangingAnalyzer::new(policy).analyze(race, filter, cancel)
            },
        )
        .await
    }

    /// Reaction-after-mistake analysis
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown result list, or a collaborator error
    pub async fn analyze_mental_resilience(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
    ) -> AppResult<Analysis<MentalResilienceProfile, MentalResilienceStatistics>> {
        self.analyze_mental_resilience_cancellable(
            result_list_id,
            filter,
            CancellationToken::new(),
        )
        .await
    }

    /// Reaction-after-mistake analysis that stops when `cancel` is triggered
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze_mental_resilience`], plus `AnalysisCancelled`
    pub async fn analyze_mental_resilience_cancellable(
        &self,
        result_list_id: ResultListId,
        filter: &PersonFilter,
        cancel: CancellationToken,
    ) -> AppResult<Analysis<MentalResilienceProfile, MentalResilienceStatistics>> {
        self.run(
            AnalysisKind::MentalResilience,
            result_list_id,
            filter,
            cancel,
            |policy, race, filter, cancel| {
                MentalResilienceAnalyzer::new(policy).analyze(race, filter, cancel)
            },
        )
        .await
    }

    /// Fetch inputs once, freeze them and run one analyzer on the blocking pool
    async fn run<P, S, F>(
        &self,
        kind: AnalysisKind,
        result_list_id: ResultListId,
        filter: &PersonFilter,
        cancel: CancellationToken,
        analyze: F,
    ) -> AppResult<Analysis<P, S>>
    where
        P: Send + 'static,
        S: Send + 'static,
        F: FnOnce(
                &AnalysisPolicy,
                &RaceData,
                &PersonFilter,
                &CancellationToken,
            ) -> AppResult<Analysis<P, S>>
            + Send
            + 'static,
    {
        let span = info_span!(
            "analysis",
            analysis.kind = %kind,
            result_list.id = %result_list_id
        );

        async move {
            let SplitSource::Store(split_times) = &self.splits else {
                AnalysisLogger::log_analysis_skipped(kind, result_list_id);
                return Ok(Analysis::empty(result_list_id));
            };

            let started = Instant::now();
            let (result_list, splits) = tokio::try_join!(
                self.result_lists.find_result_list(result_list_id),
                split_times.find_splits_by_result_list(result_list_id),
            )?;
            cancel.check(kind)?;

            let policy = Arc::clone(&self.policy);
            let filter = filter.clone();
            let span = Span::current();
            let (analysis, runners) = tokio::task::spawn_blocking(move || {
                span.in_scope(|| {
                    let race = RaceData::new(&result_list, splits);
                    let analysis = analyze(&policy, &race, &filter, &cancel)?;
                    Ok::<_, AppError>((analysis, race.runners().len()))
                })
            })
            .await
            .map_err(|e| AppError::internal(format!("{kind} analysis task failed: {e}")))??;

            AnalysisLogger::log_analysis_completed(
                kind,
                result_list_id,
                runners,
                analysis.runner_profiles.len(),
                u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            );
            Ok(analysis)
        }
        .instrument(span)
        .await
    }
}
