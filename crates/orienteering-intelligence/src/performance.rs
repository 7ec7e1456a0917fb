// ABOUTME: Performance index computation and Winsplits-style personal baseline (Normal PI)
// ABOUTME: Separates mistake segments from normal variance using relative and absolute loss together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Performance-Index & Baseline Engine
//!
//! PI = runner duration / reference duration (1.0 is par). A runner's Normal
//! PI is derived with the Winsplits method:
//!
//! 1. `diff% = (PI - 1) * 100` for every segment
//! 2. preliminary median of `diff%`
//! 3. a segment (never the finish leg) is a mistake when it is both more than
//!    `mistake_percent_above_median` points above that median and more than
//!    `mistake_min_loss_seconds` slower than the reference
//! 4. `Normal PI = 1 + median(diff% of clean segments) / 100`

use crate::config::BaselinePolicy;
use crate::race::RunnerRace;
use crate::reference_times::ReferenceTimes;
use crate::segments::SegmentTime;
use crate::statistics::median;
use serde::{Deserialize, Serialize};

/// PI of a duration against a reference; `None` when the reference is not positive
#[must_use]
pub fn performance_index(duration_seconds: f64, reference_seconds: f64) -> Option<f64> {
    (reference_seconds > 0.0).then(|| duration_seconds / reference_seconds)
}

/// A segment with its (non-excluding) reference and PI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPerformance {
    /// The runner's segment
    pub segment: SegmentTime,
    /// Reference duration used for the PI
    pub reference_seconds: f64,
    /// Performance index
    pub performance_index: f64,
}

impl SegmentPerformance {
    /// Relative loss against the reference, in percent
    #[must_use]
    pub fn diff_percent(&self) -> f64 {
        (self.performance_index - 1.0) * 100.0
    }

    /// Absolute loss against the reference, in seconds
    #[must_use]
    pub fn loss_seconds(&self) -> f64 {
        self.segment.duration_seconds - self.reference_seconds
    }
}

/// PI of every segment of a runner that has a positive reference
#[must_use]
pub fn runner_performances(
    runner: &RunnerRace,
    references: &ReferenceTimes,
) -> Vec<SegmentPerformance> {
    runner
        .segments
        .iter()
        .filter_map(|segment| {
            let reference =
                references.reference_with_fallback(&segment.class_key(&runner.class_name))?;
            let pi = performance_index(segment.duration_seconds, reference)?;
            Some(SegmentPerformance {
                segment: segment.clone(),
                reference_seconds: reference,
                performance_index: pi,
            })
        })
        .collect()
}

/// Mistake split of a runner's segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeScan {
    /// Preliminary median of `diff%` over all segments
    pub median_diff_percent: f64,
    /// Per-segment mistake flag, aligned with the scanned slice
    pub mistakes: Vec<bool>,
}

impl MistakeScan {
    /// Number of segments that are not mistakes
    #[must_use]
    pub fn clean_count(&self) -> usize {
        self.mistakes.iter().filter(|mistake| !**mistake).count()
    }
}

/// Personal baseline of a runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Normal PI
    pub normal_pi: f64,
    /// Clean segments the baseline was computed from
    pub clean_segment_count: usize,
    /// Mistake flags of the scanned segments
    pub scan: MistakeScan,
}

/// Winsplits baseline engine
#[derive(Debug, Clone, Copy)]
pub struct BaselineEngine<'a> {
    policy: &'a BaselinePolicy,
}

impl<'a> BaselineEngine<'a> {
    /// Create an engine for the given policy
    #[must_use]
    pub const fn new(policy: &'a BaselinePolicy) -> Self {
        Self { policy }
    }

    /// Whether a segment is a mistake given the preliminary median
    #[must_use]
    pub fn is_mistake(&self, performance: &SegmentPerformance, median_diff_percent: f64) -> bool {
        !performance.segment.is_finish_leg()
            && performance.diff_percent()
                > median_diff_percent + self.policy.mistake_percent_above_median
            && performance.loss_seconds() > self.policy.mistake_min_loss_seconds
    }

    /// Flag mistakes among the given segments; `None` for an empty slice
    #[must_use]
    pub fn scan(&self, performances: &[SegmentPerformance]) -> Option<MistakeScan> {
        let diffs: Vec<f64> = performances
            .iter()
            .map(SegmentPerformance::diff_percent)
            .collect();
        let median_diff_percent = median(&diffs)?;
        let mistakes = performances
            .iter()
            .map(|performance| self.is_mistake(performance, median_diff_percent))
            .collect();
        Some(MistakeScan {
            median_diff_percent,
            mistakes,
        })
    }

    /// Normal PI over the given segments
    ///
    /// Returns `None` when fewer than `min_clean_segments` segments survive the
    /// mistake filter; such runners have no baseline.
    #[must_use]
    pub fn baseline(&self, performances: &[SegmentPerformance]) -> Option<Baseline> {
        let scan = self.scan(performances)?;
        let clean_diffs: Vec<f64> = performances
            .iter()
            .zip(&scan.mistakes)
            .filter(|(_, mistake)| !**mistake)
            .map(|(performance, _)| performance.diff_percent())
            .collect();
        if clean_diffs.len() < self.policy.min_clean_segments {
            return None;
        }
        let clean_median = median(&clean_diffs)?;
        Some(Baseline {
            normal_pi: 1.0 + clean_median / 100.0,
            clean_segment_count: clean_diffs.len(),
            scan,
        })
    }
}
