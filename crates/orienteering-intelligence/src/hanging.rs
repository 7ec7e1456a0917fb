// ABOUTME: Hanging (drafting) detector pairing fast passenger segments with nearby faster drivers
// ABOUTME: Refines the passenger's Normal PI iteratively so drafted segments do not inflate their own baseline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Hanging Detector
//!
//! A segment is a hanging candidate when its Hanging Index (segment PI divided
//! by the runner's Normal PI) is at or below the policy threshold. A candidate
//! becomes a hanging segment when another runner, from any class, punched the
//! segment's end control shortly before the passenger and was faster on the
//! same segment.
//!
//! The Normal PI is refined per runner: flagged segments are removed and the
//! baseline recomputed until it moves by less than the convergence epsilon,
//! no further pairs are found, or the iteration cap is hit.

use crate::analysis::{
    map_runners, Analysis, AnalysisKind, CancellationToken, ClassContext, RaceAnalyzer,
};
use crate::config::{AnalysisPolicy, HangingPolicy};
use crate::performance::{runner_performances, BaselineEngine, SegmentPerformance};
use crate::race::{PersonFilter, RaceData, RunnerRace};
use crate::reference_times::ReferenceTimes;
use crate::statistics::{mean, median};
use orienteering_core::errors::AppResult;
use orienteering_core::models::{ControlPoint, PersonId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Hanging classification of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HangingClassification {
    /// No hanging segment
    NoHanging,
    /// Some hanging segments, below the high bar
    ModerateHanging,
    /// Many hanging segments, by count or share
    HighHanging,
    /// No eligible segment or no baseline
    InsufficientData,
}

impl HangingClassification {
    /// Classify from hanging segment count and share of eligible segments
    #[must_use]
    pub fn from_counts(
        hanging_segments: usize,
        eligible_segments: usize,
        policy: &HangingPolicy,
    ) -> Self {
        if eligible_segments == 0 {
            return Self::InsufficientData;
        }
        if hanging_segments == 0 {
            return Self::NoHanging;
        }
        if hanging_segments >= policy.high_segment_count
            || hanging_percentage(hanging_segments, eligible_segments) >= policy.high_percentage
        {
            Self::HighHanging
        } else {
            Self::ModerateHanging
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn hanging_percentage(hanging_segments: usize, eligible_segments: usize) -> f64 {
    if eligible_segments == 0 {
        0.0
    } else {
        hanging_segments as f64 / eligible_segments as f64 * 100.0
    }
}

/// A passenger segment explained by one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangingPair {
    /// Passenger's leg number
    pub leg_number: u32,
    /// Start control
    pub from: ControlPoint,
    /// End control
    pub to: ControlPoint,
    /// Runner followed
    pub driver_person_id: PersonId,
    /// Driver's class, which may differ from the passenger's
    pub driver_class_name: String,
    /// Driver's race number
    pub driver_race_number: u32,
    /// Seconds the driver punched `to` before the passenger
    pub time_gap_seconds: f64,
    /// Passenger's PI on the segment
    pub passenger_pi: f64,
    /// Driver's PI on the segment
    pub driver_pi: f64,
    /// Passenger PI / Normal PI
    pub hanging_index: f64,
}

/// A runner's hanging profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangingProfile {
    /// Runner
    pub person_id: PersonId,
    /// Class
    pub class_name: String,
    /// Race number
    pub race_number: u32,
    /// Class size context
    #[serde(flatten)]
    pub class_context: ClassContext,
    /// Refined Normal PI used in the final detection pass
    pub normal_pi: Option<f64>,
    /// Normal PI over every segment, before refinement
    pub naive_normal_pi: Option<f64>,
    /// Inner segments (start and finish legs excluded)
    pub eligible_segment_count: usize,
    /// Eligible segments with at least one driver
    pub hanging_segment_count: usize,
    /// Hanging segments as a percentage of eligible segments
    pub hanging_percentage: f64,
    /// Every passenger/driver pair, in course order
    pub pairs: Vec<HangingPair>,
    /// Classification
    pub classification: HangingClassification,
    /// Detection passes run
    pub iterations: usize,
    /// Whether the baseline settled before the iteration cap
    pub converged: bool,
}

/// Aggregate hanging statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HangingStatistics {
    /// Profiles in the analysis
    pub total_runners: usize,
    /// Runners per classification
    pub runners_by_classification: BTreeMap<HangingClassification, usize>,
    /// Pairs over all runners
    pub total_pairs: usize,
    /// Mean hanging index over all pairs
    pub mean_hanging_index: Option<f64>,
    /// Median hanging index over all pairs
    pub median_hanging_index: Option<f64>,
}

impl HangingStatistics {
    /// Aggregate over profiles
    #[must_use]
    pub fn from_profiles(profiles: &[HangingProfile]) -> Self {
        let indices: Vec<f64> = profiles
            .iter()
            .flat_map(|profile| profile.pairs.iter().map(|pair| pair.hanging_index))
            .collect();
        let runners_by_classification = profiles.iter().fold(BTreeMap::new(), |mut counts, profile| {
            *counts.entry(profile.classification).or_insert(0) += 1;
            counts
        });

        Self {
            total_runners: profiles.len(),
            runners_by_classification,
            total_pairs: indices.len(),
            mean_hanging_index: mean(&indices),
            median_hanging_index: median(&indices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SegmentPiKey {
    person_id: PersonId,
    race_number: u32,
    from: ControlPoint,
    to: ControlPoint,
}

/// PI of every runner on every segment
///
/// Keys leave out class and leg number so drivers from other classes, whose
/// leg numbering differs, are found on the same control pair.
#[derive(Debug, Clone, Default)]
pub struct SegmentPiCache {
    entries: HashMap<SegmentPiKey, f64>,
}

impl SegmentPiCache {
    /// Compute every runner's segment PIs
    #[must_use]
    pub fn build(race: &RaceData, references: &ReferenceTimes) -> Self {
        let entries = race
            .runners()
            .par_iter()
            .flat_map_iter(|runner| {
                runner_performances(runner, references)
                    .into_iter()
                    .map(move |performance| {
                        (
                            SegmentPiKey {
                                person_id: runner.person_id,
                                race_number: runner.race_number,
                                from: performance.segment.from,
                                to: performance.segment.to,
                            },
                            performance.performance_index,
                        )
                    })
            })
            .collect();
        Self { entries }
    }

    /// PI of a runner on a control pair
    #[must_use]
    pub fn get(
        &self,
        person_id: PersonId,
        race_number: u32,
        from: &ControlPoint,
        to: &ControlPoint,
    ) -> Option<f64> {
        self.entries
            .get(&SegmentPiKey {
                person_id,
                race_number,
                from: from.clone(),
                to: to.clone(),
            })
            .copied()
    }
}

/// One absolute punch in the punch index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPunch {
    /// Punch time in seconds since the Unix epoch
    pub epoch_seconds: f64,
    /// Runner who punched
    pub person_id: PersonId,
    /// Runner's class
    pub class_name: String,
    /// Runner's race number
    pub race_number: u32,
}

/// Absolute punch times per control over every class, ascending
#[derive(Debug, Clone, Default)]
pub struct PunchIndex {
    controls: HashMap<String, Vec<IndexedPunch>>,
}

impl PunchIndex {
    /// Index every timed punch of runners with a known start time
    #[must_use]
    pub fn build(race: &RaceData) -> Self {
        let mut controls = race
            .runners()
            .iter()
            .filter_map(|runner| runner.start_epoch_seconds().map(|start| (runner, start)))
            .flat_map(|(runner, start)| {
                runner.punches.iter().filter_map(move |punch| {
                    punch.punch_time_seconds.map(|seconds| {
                        (
                            punch.control_code.clone(),
                            IndexedPunch {
                                epoch_seconds: start + seconds,
                                person_id: runner.person_id,
                                class_name: runner.class_name.clone(),
                                race_number: runner.race_number,
                            },
                        )
                    })
                })
            })
            .fold(
                HashMap::<String, Vec<IndexedPunch>>::new(),
                |mut controls, (code, punch)| {
                    controls.entry(code).or_default().push(punch);
                    controls
                },
            );
        for punches in controls.values_mut() {
            punches.sort_by(|a, b| {
                a.epoch_seconds
                    .total_cmp(&b.epoch_seconds)
                    .then(a.person_id.cmp(&b.person_id))
                    .then(a.race_number.cmp(&b.race_number))
            });
        }
        Self { controls }
    }

    /// Punches at a control within `window_seconds` before (or at) a time
    #[must_use]
    pub fn punched_before(
        &self,
        control_code: &str,
        epoch_seconds: f64,
        window_seconds: f64,
    ) -> &[IndexedPunch] {
        let Some(punches) = self.controls.get(control_code) else {
            return &[];
        };
        let first = punches.partition_point(|p| p.epoch_seconds < epoch_seconds - window_seconds);
        let end = punches.partition_point(|p| p.epoch_seconds <= epoch_seconds);
        punches.get(first..end).unwrap_or(&[])
    }
}

/// Outcome of one detection pass
#[derive(Debug, Clone, Default)]
struct Detection {
    normal_pi: f64,
    flagged_legs: BTreeSet<u32>,
    pairs: Vec<HangingPair>,
}

/// Frozen lookups shared by every runner of one analysis
struct HangingContext<'r> {
    race: &'r RaceData,
    references: ReferenceTimes,
    cache: SegmentPiCache,
    punches: PunchIndex,
}

/// Drafting detection
#[derive(Debug, Clone, Copy)]
pub struct HangingAnalyzer<'a> {
    policy: &'a AnalysisPolicy,
}

impl<'a> HangingAnalyzer<'a> {
    /// Create an analyzer for the given policy
    #[must_use]
    pub const fn new(policy: &'a AnalysisPolicy) -> Self {
        Self { policy }
    }

    fn detect(
        &self,
        context: &HangingContext<'_>,
        runner: &RunnerRace,
        eligible: &[&SegmentPerformance],
        normal_pi: f64,
    ) -> Detection {
        let hanging = &self.policy.hanging;
        let start = runner.start_epoch_seconds();

        eligible.iter().fold(
            Detection {
                normal_pi,
                ..Detection::default()
            },
            |mut detection, performance| {
                let hanging_index = performance.performance_index / normal_pi;
                if hanging_index > hanging.hanging_index_threshold {
                    return detection;
                }
                detection.flagged_legs.insert(performance.segment.leg_number);

                let (Some(start), Some(code)) = (start, performance.segment.to.control_code())
                else {
                    return detection;
                };
                let passenger_time = start + performance.segment.split_seconds;
                let drivers = context
                    .punches
                    .punched_before(code, passenger_time, hanging.proximity_window_seconds)
                    .iter()
                    .filter(|punch| punch.person_id != runner.person_id)
                    .filter_map(|punch| {
                        let driver_pi = context.cache.get(
                            punch.person_id,
                            punch.race_number,
                            &performance.segment.from,
                            &performance.segment.to,
                        )?;
                        (driver_pi < performance.performance_index).then(|| HangingPair {
                            leg_number: performance.segment.leg_number,
                            from: performance.segment.from.clone(),
                            to: performance.segment.to.clone(),
                            driver_person_id: punch.person_id,
                            driver_class_name: punch.class_name.clone(),
                            driver_race_number: punch.race_number,
                            time_gap_seconds: passenger_time - punch.epoch_seconds,
                            passenger_pi: performance.performance_index,
                            driver_pi,
                            hanging_index,
                        })
                    });
                detection.pairs.extend(drivers);
                detection
            },
        )
    }

    fn analyze_runner(
        &self,
        context: &HangingContext<'_>,
        runner: &RunnerRace,
        cancel: &CancellationToken,
    ) -> AppResult<HangingProfile> {
        let class_context = ClassContext::of(context.race, runner, &self.policy.gates);
        let performances = runner_performances(runner, &context.references);
        let eligible: Vec<&SegmentPerformance> = performances
            .iter()
            .filter(|performance| performance.segment.is_inner_leg())
            .collect();

        let engine = BaselineEngine::new(&self.policy.baseline);
        let naive = engine
            .baseline(&performances)
            .filter(|_| class_context.passes(&self.policy.gates) && !eligible.is_empty());
        let Some(naive) = naive else {
            debug!(
                person_id = %runner.person_id,
                class_name = %runner.class_name,
                eligible_segments = eligible.len(),
                "Hanging: insufficient data"
            );
            return Ok(self.profile(runner, class_context, eligible.len(), None, 0, false));
        };

        let hanging = &self.policy.hanging;
        let mut current = naive.normal_pi;
        let mut removed_legs = BTreeSet::new();
        let mut result = Detection {
            normal_pi: current,
            ..Detection::default()
        };
        let mut iterations = 0;
        let mut converged = false;

        while iterations < hanging.max_iterations {
            cancel.check(self.kind())?;
            iterations += 1;

            let detection = self.detect(context, runner, &eligible, current);
            debug!(
                person_id = %runner.person_id,
                iteration = iterations,
                normal_pi = current,
                pairs = detection.pairs.len(),
                "Hanging iteration"
            );
            if detection.pairs.is_empty() {
                result = detection;
                converged = true;
                break;
            }

            removed_legs.extend(detection.flagged_legs.iter().copied());
            let clean: Vec<SegmentPerformance> = performances
                .iter()
                .filter(|performance| !removed_legs.contains(&performance.segment.leg_number))
                .cloned()
                .collect();
            result = detection;
            // Too few clean segments left: keep the baseline this pass used
            let Some(refined) = engine.baseline(&clean) else {
                break;
            };
            if (refined.normal_pi - current).abs() < hanging.convergence_epsilon {
                converged = true;
                break;
            }
            current = refined.normal_pi;
        }

        Ok(self.profile(
            runner,
            class_context,
            eligible.len(),
            Some((naive.normal_pi, result)),
            iterations,
            converged,
        ))
    }

    fn profile(
        &self,
        runner: &RunnerRace,
        class_context: ClassContext,
        eligible_segment_count: usize,
        detection: Option<(f64, Detection)>,
        iterations: usize,
        converged: bool,
    ) -> HangingProfile {
        let (naive_normal_pi, normal_pi, pairs) = match detection {
            Some((naive, detection)) => (Some(naive), Some(detection.normal_pi), detection.pairs),
            None => (None, None, Vec::new()),
        };
        let hanging_segment_count = pairs
            .iter()
            .map(|pair| pair.leg_number)
            .collect::<BTreeSet<_>>()
            .len();
        let classification = if normal_pi.is_none() {
            HangingClassification::InsufficientData
        } else {
            HangingClassification::from_counts(
                hanging_segment_count,
                eligible_segment_count,
                &self.policy.hanging,
            )
        };

        HangingProfile {
            person_id: runner.person_id,
            class_name: runner.class_name.clone(),
            race_number: runner.race_number,
            class_context,
            normal_pi,
            naive_normal_pi,
            eligible_segment_count,
            hanging_segment_count,
            hanging_percentage: hanging_percentage(hanging_segment_count, eligible_segment_count),
            pairs,
            classification,
            iterations,
            converged,
        }
    }
}

impl RaceAnalyzer for HangingAnalyzer<'_> {
    type Profile = HangingProfile;
    type Statistics = HangingStatistics;

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Hanging
    }

    fn analyze(
        &self,
        race: &RaceData,
        filter: &PersonFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Analysis<HangingProfile, HangingStatistics>> {
        let references = ReferenceTimes::build(race, &self.policy.reference);
        let cache = SegmentPiCache::build(race, &references);
        let punches = PunchIndex::build(race);
        let context = HangingContext {
            race,
            references,
            cache,
            punches,
        };

        let runners = race.selected_runners(filter);
        let profiles = map_runners(&runners, self.kind(), cancel, |runner| {
            self.analyze_runner(&context, runner, cancel).map(Some)
        })?;
        let statistics = HangingStatistics::from_profiles(&profiles);

        Ok(Analysis {
            result_list_id: race.result_list_id,
            event_id: Some(race.event_id),
            runner_profiles: profiles,
            statistics: Some(statistics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punch(epoch_seconds: f64, person: i64) -> IndexedPunch {
        IndexedPunch {
            epoch_seconds,
            person_id: PersonId(person),
            class_name: "H21".to_owned(),
            race_number: 1,
        }
    }

    #[test]
    fn test_classification_by_count_and_share() {
        let policy = AnalysisPolicy::default().hanging;

        assert_eq!(
            HangingClassification::from_counts(0, 10, &policy),
            HangingClassification::NoHanging
        );
        assert_eq!(
            HangingClassification::from_counts(2, 10, &policy),
            HangingClassification::ModerateHanging
        );
        // 3 segments reach the count bar, 3 of 10 the share bar
        assert_eq!(
            HangingClassification::from_counts(3, 20, &policy),
            HangingClassification::HighHanging
        );
        assert_eq!(
            HangingClassification::from_counts(2, 6, &policy),
            HangingClassification::HighHanging
        );
        assert_eq!(
            HangingClassification::from_counts(0, 0, &policy),
            HangingClassification::InsufficientData
        );
    }

    #[test]
    fn test_punch_window_is_inclusive_and_looks_back_only() {
        let index = PunchIndex {
            controls: HashMap::from([(
                "45".to_owned(),
                vec![
                    punch(930.0, 1),
                    punch(970.0, 2),
                    punch(1_000.0, 3),
                    punch(1_001.0, 4),
                ],
            )]),
        };

        let persons: Vec<i64> = index
            .punched_before("45", 1_000.0, 30.0)
            .iter()
            .map(|punch| punch.person_id.value())
            .collect();
        assert_eq!(persons, vec![2, 3]);
        assert!(index.punched_before("46", 1_000.0, 30.0).is_empty());
    }
}
