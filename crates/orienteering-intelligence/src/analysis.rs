// ABOUTME: Shared analysis envelope, analyzer trait, cancellation and per-runner fan-out
// ABOUTME: Runners are mapped in parallel over frozen lookup structures and kept in input order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::{AnalysisPolicy, GatePolicy};
use crate::performance::{runner_performances, Baseline, BaselineEngine, SegmentPerformance};
use crate::race::{PersonFilter, RaceData, RunnerRace};
use crate::reference_times::ReferenceTimes;
use orienteering_core::errors::{AppError, AppResult};
use orienteering_core::models::{EventId, ResultListId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The four analyses offered over a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisKind {
    /// Robust course-cutting detection
    Anomaly,
    /// Flat-threshold course-cutting detection
    Cheating,
    /// Drafting detection
    Hanging,
    /// Reaction after navigation mistakes
    MentalResilience,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anomaly => "anomaly",
            Self::Cheating => "cheating",
            Self::Hanging => "hanging",
            Self::MentalResilience => "mental resilience",
        };
        f.write_str(name)
    }
}

/// Result of one analysis over a result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis<P, S> {
    /// Analyzed result list
    pub result_list_id: ResultListId,
    /// Event of the result list (`None` for an empty analysis)
    pub event_id: Option<EventId>,
    /// One profile per analyzed runner
    pub runner_profiles: Vec<P>,
    /// Aggregate statistics over the profiles
    pub statistics: Option<S>,
}

impl<P, S> Analysis<P, S> {
    /// Analysis without any runner, used when no split store is configured
    #[must_use]
    pub const fn empty(result_list_id: ResultListId) -> Self {
        Self {
            result_list_id,
            event_id: None,
            runner_profiles: Vec::new(),
            statistics: None,
        }
    }
}

/// An analyzer over a frozen race snapshot
pub trait RaceAnalyzer: Sync {
    /// Per-runner output
    type Profile: Send;
    /// Aggregate output
    type Statistics;

    /// Which analysis this is
    fn kind(&self) -> AnalysisKind;

    /// Analyze the selected runners
    ///
    /// # Errors
    ///
    /// Returns `AnalysisCancelled` when the token is cancelled mid-run
    fn analyze(
        &self,
        race: &RaceData,
        filter: &PersonFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Analysis<Self::Profile, Self::Statistics>>;
}

/// Cooperative cancellation for long-running batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with `AnalysisCancelled` if cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns `AnalysisCancelled` when cancelled
    pub fn check(&self, kind: AnalysisKind) -> AppResult<()> {
        if self.is_cancelled() {
            Err(AppError::cancelled(kind.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Class-size context attached to every profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassContext {
    /// Runners in the runner's class
    pub class_runner_count: usize,
    /// Whether the class is large enough for reliable results
    pub reliable_data: bool,
}

impl ClassContext {
    /// Context of a runner's class
    #[must_use]
    pub fn of(race: &RaceData, runner: &RunnerRace, gates: &GatePolicy) -> Self {
        let class_runner_count = race.class_runner_count(&runner.class_name);
        Self {
            class_runner_count,
            reliable_data: class_runner_count >= gates.reliable_runners_threshold,
        }
    }

    /// Whether the class passes the minimum-runner gate
    #[must_use]
    pub const fn passes(&self, gates: &GatePolicy) -> bool {
        self.class_runner_count >= gates.min_class_runners
    }
}

/// A runner that passed the class gate and has a baseline
#[derive(Debug, Clone)]
pub(crate) struct QualifiedRunner {
    pub context: ClassContext,
    pub performances: Vec<SegmentPerformance>,
    pub baseline: Baseline,
}

/// Apply the class-size gate and compute the runner's baseline
///
/// Runners failing either step are omitted from the analysis output.
pub(crate) fn qualify_runner(
    race: &RaceData,
    runner: &RunnerRace,
    references: &ReferenceTimes,
    policy: &AnalysisPolicy,
    kind: AnalysisKind,
) -> Option<QualifiedRunner> {
    let context = ClassContext::of(race, runner, &policy.gates);
    if !context.passes(&policy.gates) {
        debug!(
            person_id = %runner.person_id,
            class_name = %runner.class_name,
            class_runner_count = context.class_runner_count,
            analysis = %kind,
            "Runner skipped: class too small"
        );
        return None;
    }

    let performances = runner_performances(runner, references);
    let Some(baseline) = BaselineEngine::new(&policy.baseline).baseline(&performances) else {
        debug!(
            person_id = %runner.person_id,
            class_name = %runner.class_name,
            segments = performances.len(),
            analysis = %kind,
            "Runner skipped: not enough clean segments for a baseline"
        );
        return None;
    };

    Some(QualifiedRunner {
        context,
        performances,
        baseline,
    })
}

/// Map the selected runners in parallel, keeping input order
///
/// `None` results (runners without enough data) are dropped. Cancellation is
/// checked before each runner.
pub(crate) fn map_runners<T, F>(
    runners: &[&RunnerRace],
    kind: AnalysisKind,
    cancel: &CancellationToken,
    analyze_runner: F,
) -> AppResult<Vec<T>>
where
    T: Send,
    F: Fn(&RunnerRace) -> AppResult<Option<T>> + Sync + Send,
{
    let profiles: Vec<Option<T>> = runners
        .par_iter()
        .map(|runner| {
            cancel.check(kind)?;
            analyze_runner(*runner)
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(profiles.into_iter().flatten().collect())
}
