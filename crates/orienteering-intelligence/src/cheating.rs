// ABOUTME: Cheating classifier flagging fast segments with flat PI and anomaly-index thresholds
// ABOUTME: Class pool only, exact self-exclusion and a top-N mean reference over every leg
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Cheating Classifier
//!
//! A deliberately simple sibling of the anomaly classifier. It can disagree
//! with the anomaly classifier on the same runner: the runner's own time is
//! removed by exact equality, the reference is the plain mean of the fastest
//! remaining class times, and thresholds do not scale with segment length.

use crate::analysis::{
    map_runners, qualify_runner, Analysis, AnalysisKind, CancellationToken, RaceAnalyzer,
};
use crate::config::{AnalysisPolicy, CheatingPolicy};
use crate::race::{PersonFilter, RaceData, RunnerRace};
use crate::reference_times::{exclude_runner, top_n_mean, ReferenceTimes};
use crate::suspicion::{
    PoolSource, ReferenceMethod, SuspicionLevel, SuspicionProfile, SuspicionStatistics,
    SuspiciousSegment,
};
use orienteering_core::errors::AppResult;

/// Classify a segment with flat thresholds
#[must_use]
pub fn classify(pi_real: f64, ai_value: f64, policy: &CheatingPolicy) -> SuspicionLevel {
    if pi_real < policy.high_pi && ai_value < policy.high_ai {
        SuspicionLevel::HighSuspicion
    } else if pi_real < policy.moderate_pi && ai_value < policy.moderate_ai {
        SuspicionLevel::ModerateSuspicion
    } else {
        SuspicionLevel::NoSuspicion
    }
}

/// Flat-threshold course-cutting detection
#[derive(Debug, Clone, Copy)]
pub struct CheatingAnalyzer<'a> {
    policy: &'a AnalysisPolicy,
}

impl<'a> CheatingAnalyzer<'a> {
    /// Create an analyzer for the given policy
    #[must_use]
    pub const fn new(policy: &'a AnalysisPolicy) -> Self {
        Self { policy }
    }

    fn analyze_runner(
        &self,
        race: &RaceData,
        references: &ReferenceTimes,
        runner: &RunnerRace,
    ) -> Option<SuspicionProfile> {
        let qualified = qualify_runner(race, runner, references, self.policy, self.kind())?;
        let normal_pi = qualified.baseline.normal_pi;
        let cheating = &self.policy.cheating;

        let assessments = runner
            .segments
            .iter()
            .filter_map(|segment| {
                let pool = exclude_runner(
                    references.pool(&segment.class_key(&runner.class_name)),
                    segment.duration_seconds,
                    cheating.self_exclusion,
                );
                let reference = top_n_mean(&pool.times, self.policy.reference.top_n)
                    .filter(|reference| *reference > 0.0)?;
                Some(SuspiciousSegment::assess(
                    segment,
                    reference,
                    PoolSource::Class,
                    ReferenceMethod::TopMean,
                    normal_pi,
                    |pi_real, ai_value, _| classify(pi_real, ai_value, cheating),
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

impl RaceAnalyzer for CheatingAnalyzer<'_> {
    type Profile = SuspicionProfile;
    type Statistics = SuspicionStatistics;

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Cheating
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
