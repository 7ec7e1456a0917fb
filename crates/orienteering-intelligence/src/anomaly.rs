// ABOUTME: Anomaly classifier detecting implausibly fast segments against a robust cleaned reference
// ABOUTME: Self-excludes the runner, guards against slow majorities and shortcut clusters, scales thresholds by segment length
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Anomaly Classifier
//!
//! Every inner segment of a qualified runner is compared against a reference
//! computed without the runner's own duration. The reference selection is
//! robust against two contaminations of the top group:
//!
//! - a slow majority that made a common mistake (use the two fastest)
//! - a tight cluster of fast times that cut the course together (use the
//!   honest group below it)
//!
//! Classification thresholds depend on the reference duration so short legs
//! need a proportionally larger gain before they are flagged, and a segment
//! whose anomaly index stays close to 1 is never suspicious.

use crate::analysis::{
    map_runners, qualify_runner, Analysis, AnalysisKind, CancellationToken, RaceAnalyzer,
};
use crate::config::{
    AnalysisPolicy, AnomalyPolicy, AnomalyThresholds, MajorityMistakePolicy, ShortcutClusterPolicy,
};
use crate::race::{PersonFilter, RaceData, RunnerRace};
use crate::reference_times::{exclude_runner, ExcludedPool, ReferenceTimes};
use crate::segments::SegmentTime;
use crate::statistics::{coefficient_of_variation, mean, median_sorted};
use crate::suspicion::{
    PoolSource, ReferenceMethod, SuspicionLevel, SuspicionProfile, SuspicionStatistics,
    SuspiciousSegment,
};
use orienteering_core::errors::AppResult;

/// A self-excluded reference with its provenance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanedReference {
    /// Reference duration in seconds
    pub seconds: f64,
    /// Pool the reference came from
    pub source: PoolSource,
    /// Selection rule applied to the pool
    pub method: ReferenceMethod,
}

/// Select a reference from a self-excluded pool
///
/// Returns `None` for an empty pool.
#[must_use]
pub fn robust_reference(
    pool: &ExcludedPool,
    policy: &AnomalyPolicy,
    top_n: usize,
) -> Option<(f64, ReferenceMethod)> {
    let times = pool.times.as_slice();
    match times {
        [] => None,
        [fastest] | [fastest, _] => Some((*fastest, ReferenceMethod::FastestRemaining)),
        _ => slow_majority(times, &policy.majority)
            .or_else(|| shortcut_cluster(times, pool.runner_rank, &policy.cluster))
            .or_else(|| {
                median_sorted(&times[..times.len().min(top_n)])
                    .map(|median| (median, ReferenceMethod::TopMedian))
            }),
    }
}

/// Two outstanding fast times over a dispersed slow majority
fn slow_majority(times: &[f64], policy: &MajorityMistakePolicy) -> Option<(f64, ReferenceMethod)> {
    if times.len() < policy.min_pool {
        return None;
    }
    let median = median_sorted(times)?;
    let (fastest, second) = (*times.first()?, *times.get(1)?);

    let fastest_ahead = fastest < median * (1.0 - policy.fastest_gap);
    let second_ahead = second < median * (1.0 - policy.second_gap);
    let dispersed_tail = times.len() < policy.cv_min_pool
        || coefficient_of_variation(&times[2..]).is_some_and(|cv| cv > policy.tail_cv);

    (fastest_ahead && second_ahead && dispersed_tail)
        .then(|| ((fastest + second) / 2.0, ReferenceMethod::SlowMajority))
}

/// Tight top cluster followed by a clear gap to the rest of the field
///
/// Inspected positions shift by one when the runner itself ranked among the
/// top, since its own time is no longer in the pool.
fn shortcut_cluster(
    times: &[f64],
    runner_rank: usize,
    policy: &ShortcutClusterPolicy,
) -> Option<(f64, ReferenceMethod)> {
    let adjust = usize::from(runner_rank <= policy.rank_adjust_max);
    if times.len() < policy.min_pool + adjust {
        return None;
    }
    let at = |position: usize| times.get(position + adjust).copied();
    let (top, cluster_end, seventh, eighth) = (at(0)?, at(3)?, at(6)?, at(7)?);

    let spread = (cluster_end - top) / top;
    let gap = (eighth - cluster_end) / cluster_end;
    if spread >= policy.max_spread || gap <= policy.min_gap {
        return None;
    }

    let last = if (eighth - seventh) / seventh > policy.tail_outlier_gap {
        6
    } else {
        7
    };
    mean(&times[4 + adjust..=last + adjust]).map(|m| (m, ReferenceMethod::ShortcutCluster))
}

/// Classify a segment with length-aware thresholds
#[must_use]
pub fn classify(
    pi_real: f64,
    ai_value: f64,
    cleaned_reference_seconds: f64,
    time_difference_seconds: f64,
    thresholds: &AnomalyThresholds,
) -> SuspicionLevel {
    if cleaned_reference_seconds <= 0.0 {
        return SuspicionLevel::NoData;
    }
    let consistency_upper = 1.0 / thresholds.consistency_lower;
    if (thresholds.consistency_lower..=consistency_upper).contains(&ai_value) {
        return SuspicionLevel::NoSuspicion;
    }

    let moderate_time = (cleaned_reference_seconds * thresholds.moderate_time_fraction).clamp(
        thresholds.moderate_time_min_seconds,
        thresholds.moderate_time_max_seconds,
    );
    let high_time = moderate_time * thresholds.high_time_multiplier;
    let multiplier = if cleaned_reference_seconds < thresholds.short_segment_seconds {
        thresholds.short_segment_multiplier
    } else {
        1.0
    };

    let high_ratio = thresholds.high_ratio * multiplier;
    let moderate_ratio = thresholds.moderate_ratio * multiplier;
    if pi_real < high_ratio && ai_value < high_ratio && time_difference_seconds >= high_time {
        SuspicionLevel::HighSuspicion
    } else if pi_real < moderate_ratio
        && ai_value < moderate_ratio
        && time_difference_seconds >= moderate_time
    {
        SuspicionLevel::ModerateSuspicion
    } else {
        SuspicionLevel::NoSuspicion
    }
}

/// Robust course-cutting detection
#[derive(Debug, Clone, Copy)]
pub struct AnomalyAnalyzer<'a> {
    policy: &'a AnalysisPolicy,
}

impl<'a> AnomalyAnalyzer<'a> {
    /// Create an analyzer for the given policy
    #[must_use]
    pub const fn new(policy: &'a AnalysisPolicy) -> Self {
        Self { policy }
    }

    /// Reference for a runner's segment with the runner's own time removed
    ///
    /// Small class pools fall back to the cross-class pool.
    #[must_use]
    pub fn cleaned_reference(
        &self,
        references: &ReferenceTimes,
        class_name: &str,
        segment: &SegmentTime,
    ) -> Option<CleanedReference> {
        let tolerance = self.policy.anomaly.self_exclusion;
        let class_pool = exclude_runner(
            references.pool(&segment.class_key(class_name)),
            segment.duration_seconds,
            tolerance,
        );
        let (pool, source) = if class_pool.times.len() < self.policy.gates.cross_class_fallback_below
        {
            let cross_pool = exclude_runner(
                references.pool(&segment.cross_class_key()),
                segment.duration_seconds,
                tolerance,
            );
            (cross_pool, PoolSource::CrossClass)
        } else {
            (class_pool, PoolSource::Class)
        };

        let (seconds, method) =
            robust_reference(&pool, &self.policy.anomaly, self.policy.reference.top_n)?;
        Some(CleanedReference {
            seconds,
            source,
            method,
        })
    }

    fn analyze_runner(
        &self,
        race: &RaceData,
        references: &ReferenceTimes,
        runner: &RunnerRace,
    ) -> Option<SuspicionProfile> {
        let qualified = qualify_runner(race, runner, references, self.policy, self.kind())?;
        let normal_pi = qualified.baseline.normal_pi;
        let thresholds = &self.policy.anomaly.thresholds;

        let assessments = runner
            .inner_segments()
            .filter_map(|segment| {
                let reference = self
                    .cleaned_reference(references, &runner.class_name, segment)
                    .filter(|reference| reference.seconds > 0.0)?;
                Some(SuspiciousSegment::assess(
                    segment,
                    reference.seconds,
                    reference.source,
                    reference.method,
                    normal_pi,
                    |pi_real, ai_value, time_difference| {
                        classify(pi_real, ai_value, reference.seconds, time_difference, thresholds)
                    },
                ))
            })
            .collect();

        Some(SuspicionProfile::from_assessments(
            runner,
            qualified.context,
            normal_pi,
            assessments,
        ))
    }
}

impl RaceAnalyzer for AnomalyAnalyzer<'_> {
    type Profile = SuspicionProfile;
    type Statistics = SuspicionStatistics;

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Anomaly
    }

    fn analyze(
        &self,
        race: &RaceData,
        filter: &PersonFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Analysis<SuspicionProfile, SuspicionStatistics>> {
        let references = ReferenceTimes::build(race, &self.policy.reference);
        let runners = race.selected_runners(filter);
        let profiles = map_runners(&runners, self.kind(), cancel, |runner| {
            Ok(self.analyze_runner(race, &references, runner))
        })?;
        let statistics = SuspicionStatistics::from_profiles(&profiles);

        Ok(Analysis {
            result_list_id: race.result_list_id,
            event_id: Some(race.event_id),
            runner_profiles: profiles,
            statistics: Some(statistics),
        })
    }
}
