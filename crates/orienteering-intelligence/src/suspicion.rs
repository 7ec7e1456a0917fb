// ABOUTME: Shared output types for the anomaly and cheating classifiers
// ABOUTME: Segment assessments, runner profiles with a representative segment, and aggregate counts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::analysis::ClassContext;
use crate::race::RunnerRace;
use crate::segments::SegmentTime;
use orienteering_core::models::{ControlPoint, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suspicion level of a segment or runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuspicionLevel {
    /// Nothing unusual
    NoSuspicion,
    /// Moderately suspicious segment
    ModerateSuspicion,
    /// Highly suspicious segment
    HighSuspicion,
    /// No usable reference time
    NoData,
}

impl SuspicionLevel {
    /// Whether the level is reported as a flagged segment
    #[must_use]
    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::ModerateSuspicion | Self::HighSuspicion)
    }
}

/// Which pool a cleaned reference was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolSource {
    /// Runners of the same class
    Class,
    /// Runners of every class on the same segment
    CrossClass,
}

/// How the cleaned reference was selected from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceMethod {
    /// Fastest remaining time of a tiny pool
    FastestRemaining,
    /// Mean of the two fastest when the slow majority erred
    SlowMajority,
    /// Mean of the honest group below a suspected shortcut cluster
    ShortcutCluster,
    /// Median of the fastest times
    TopMedian,
    /// Mean of the fastest times
    TopMean,
}

/// Assessment of one segment against a self-excluded reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousSegment {
    /// Leg number
    pub leg_number: u32,
    /// Start control
    pub from: ControlPoint,
    /// End control
    pub to: ControlPoint,
    /// Runner's duration
    pub duration_seconds: f64,
    /// Reference computed without the runner
    pub cleaned_reference_seconds: f64,
    /// Pool the reference came from
    pub reference_source: PoolSource,
    /// Selection rule that produced the reference
    pub reference_method: ReferenceMethod,
    /// Duration / cleaned reference
    pub pi_real: f64,
    /// `pi_real` / Normal PI
    pub ai_value: f64,
    /// Cleaned reference minus duration (positive when faster)
    pub time_difference_seconds: f64,
    /// Classification
    pub classification: SuspicionLevel,
}

impl SuspiciousSegment {
    /// Assessment of a segment against a cleaned reference
    #[must_use]
    pub fn assess(
        segment: &SegmentTime,
        cleaned_reference_seconds: f64,
        reference_source: PoolSource,
        reference_method: ReferenceMethod,
        normal_pi: f64,
        classify: impl FnOnce(f64, f64, f64) -> SuspicionLevel,
    ) -> Self {
        let pi_real = segment.duration_seconds / cleaned_reference_seconds;
        let ai_value = pi_real / normal_pi;
        let time_difference_seconds = cleaned_reference_seconds - segment.duration_seconds;
        Self {
            leg_number: segment.leg_number,
            from: segment.from.clone(),
            to: segment.to.clone(),
            duration_seconds: segment.duration_seconds,
            cleaned_reference_seconds,
            reference_source,
            reference_method,
            pi_real,
            ai_value,
            time_difference_seconds,
            classification: classify(pi_real, ai_value, time_difference_seconds),
        }
    }
}

/// A runner's anomaly or cheating profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspicionProfile {
    /// Runner
    pub person_id: PersonId,
    /// Class
    pub class_name: String,
    /// Race number
    pub race_number: u32,
    /// Class size context
    #[serde(flatten)]
    pub class_context: ClassContext,
    /// Personal baseline
    pub normal_pi: f64,
    /// Segments classified moderate or high, in course order
    pub flagged_segments: Vec<SuspiciousSegment>,
    /// Flagged segment with the lowest anomaly index
    pub representative: Option<SuspiciousSegment>,
    /// Classification of the representative segment
    pub classification: SuspicionLevel,
}

impl SuspicionProfile {
    /// Build a profile from all assessed segments of a runner
    #[must_use]
    pub fn from_assessments(
        runner: &RunnerRace,
        class_context: ClassContext,
        normal_pi: f64,
        assessments: Vec<SuspiciousSegment>,
    ) -> Self {
        let flagged_segments: Vec<SuspiciousSegment> = assessments
            .into_iter()
            .filter(|segment| segment.classification.is_flagged())
            .collect();
        let representative = flagged_segments
            .iter()
            .min_by(|a, b| a.ai_value.total_cmp(&b.ai_value))
            .cloned();
        let classification = representative
            .as_ref()
            .map_or(SuspicionLevel::NoSuspicion, |segment| segment.classification);

        Self {
            person_id: runner.person_id,
            class_name: runner.class_name.clone(),
            race_number: runner.race_number,
            class_context,
            normal_pi,
            flagged_segments,
            representative,
            classification,
        }
    }
}

/// Aggregate counts over anomaly or cheating profiles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspicionStatistics {
    /// Profiles in the analysis
    pub total_runners: usize,
    /// Profiles from classes large enough for reliable results
    pub reliable_runners: usize,
    /// Flagged segments over all runners
    pub flagged_segment_count: usize,
    /// Runners per representative classification
    pub runners_by_classification: BTreeMap<SuspicionLevel, usize>,
}

impl SuspicionStatistics {
    /// Count over a set of profiles
    #[must_use]
    pub fn from_profiles(profiles: &[SuspicionProfile]) -> Self {
        profiles.iter().fold(
            Self {
                total_runners: profiles.len(),
                ..Self::default()
            },
            |mut stats, profile| {
                if profile.class_context.reliable_data {
                    stats.reliable_runners += 1;
                }
                stats.flagged_segment_count += profile.flagged_segments.len();
                *stats
                    .runners_by_classification
                    .entry(profile.classification)
                    .or_insert(0) += 1;
                stats
            },
        )
    }
}
