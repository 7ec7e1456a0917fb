// ABOUTME: Immutable race snapshot joining split records with result-list runtimes and start times
// ABOUTME: Built once per analysis request and shared read-only by every analyzer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::segments::{build_segments, SegmentTime};
use chrono::{DateTime, Utc};
use orienteering_core::models::{
    EventId, PersonId, Punch, ResultListAggregate, ResultListId, RunnerSplitRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One runner's race with derived segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerRace {
    /// Runner
    pub person_id: PersonId,
    /// Class the runner started in
    pub class_name: String,
    /// Race number
    pub race_number: u32,
    /// Finish runtime in seconds, when known
    pub runtime_seconds: Option<f64>,
    /// Recorded start time, when known
    pub start_time: Option<DateTime<Utc>>,
    /// Raw punches in course order
    pub punches: Vec<Punch>,
    /// Segments derived from punches and runtime
    pub segments: Vec<SegmentTime>,
    /// Pairs the segment builder dropped
    pub dropped_pairs: usize,
}

impl RunnerRace {
    /// Segments that are neither the start leg nor the finish leg
    pub fn inner_segments(&self) -> impl Iterator<Item = &SegmentTime> {
        self.segments.iter().filter(|segment| segment.is_inner_leg())
    }

    /// Start time as fractional seconds since the Unix epoch
    #[must_use]
    pub fn start_epoch_seconds(&self) -> Option<f64> {
        self.start_time
            .map(|start| start.timestamp_millis() as f64 / 1000.0)
    }
}

/// Restriction of an analysis to a set of persons; empty means everyone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilter {
    person_ids: BTreeSet<PersonId>,
}

impl PersonFilter {
    /// Filter that selects every runner
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter selecting only the given persons (an empty list selects everyone)
    pub fn only(person_ids: impl IntoIterator<Item = PersonId>) -> Self {
        Self {
            person_ids: person_ids.into_iter().collect(),
        }
    }

    /// Whether the filter selects everyone
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.person_ids.is_empty()
    }

    /// Whether the person is selected
    #[must_use]
    pub fn includes(&self, person_id: PersonId) -> bool {
        self.is_unrestricted() || self.person_ids.contains(&person_id)
    }
}

/// Every runner of a result list, ready for analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceData {
    /// Result list the data belongs to
    pub result_list_id: ResultListId,
    /// Event of the result list
    pub event_id: EventId,
    runners: Vec<RunnerRace>,
    class_runner_counts: BTreeMap<String, usize>,
}

impl RaceData {
    /// Join split records with the result list
    ///
    /// Runners are ordered by class, person and race so positional output is
    /// deterministic regardless of collaborator ordering.
    #[must_use]
    pub fn new(result_list: &ResultListAggregate, splits: Vec<RunnerSplitRecord>) -> Self {
        let mut runners: Vec<RunnerRace> = splits
            .into_iter()
            .map(|record| Self::join_runner(result_list, record))
            .collect();
        runners.sort_by(|a, b| {
            a.class_name
                .cmp(&b.class_name)
                .then(a.person_id.cmp(&b.person_id))
                .then(a.race_number.cmp(&b.race_number))
        });

        let class_runner_counts = runners
            .iter()
            .fold(
                BTreeMap::<String, BTreeSet<PersonId>>::new(),
                |mut classes, runner| {
                    classes
                        .entry(runner.class_name.clone())
                        .or_default()
                        .insert(runner.person_id);
                    classes
                },
            )
            .into_iter()
            .map(|(class_name, persons)| (class_name, persons.len()))
            .collect();

        Self {
            result_list_id: result_list.result_list_id,
            event_id: result_list.event_id,
            runners,
            class_runner_counts,
        }
    }

    fn join_runner(result_list: &ResultListAggregate, record: RunnerSplitRecord) -> RunnerRace {
        let race_result =
            result_list.race_result(&record.class_name, record.person_id, record.race_number);
        let runtime_seconds = race_result.and_then(|race| race.runtime_seconds);
        let start_time = race_result.and_then(|race| race.start_time);
        if race_result.is_none() {
            debug!(
                person_id = %record.person_id,
                class_name = %record.class_name,
                race_number = record.race_number,
                "Split record has no matching race result; finish leg omitted"
            );
        }

        let build = build_segments(&record.punches, runtime_seconds);
        if build.dropped_pairs > 0 {
            warn!(
                person_id = %record.person_id,
                class_name = %record.class_name,
                dropped_pairs = build.dropped_pairs,
                "Dropped control pairs with missing or non-positive split times"
            );
        }

        RunnerRace {
            person_id: record.person_id,
            class_name: record.class_name,
            race_number: record.race_number,
            runtime_seconds,
            start_time,
            punches: record.punches,
            segments: build.segments,
            dropped_pairs: build.dropped_pairs,
        }
    }

    /// Every runner, in deterministic order
    #[must_use]
    pub fn runners(&self) -> &[RunnerRace] {
        &self.runners
    }

    /// Runners selected by the filter, in deterministic order
    #[must_use]
    pub fn selected_runners(&self, filter: &PersonFilter) -> Vec<&RunnerRace> {
        self.runners
            .iter()
            .filter(|runner| filter.includes(runner.person_id))
            .collect()
    }

    /// Number of distinct runners who started in the class
    #[must_use]
    pub fn class_runner_count(&self, class_name: &str) -> usize {
        self.class_runner_counts
            .get(class_name)
            .copied()
            .unwrap_or(0)
    }
}
