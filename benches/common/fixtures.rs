// ABOUTME: Benchmark fixtures generating synthetic orienteering events
// ABOUTME: Provides deterministic result lists and split records for reproducible measurements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Benchmark fixtures generating synthetic orienteering events.
//!
//! Every class runs a course of its own controls plus a shared middle
//! section, so class pools, cross-class pools and the punch index are all
//! exercised.

use chrono::{DateTime, Utc};
use orienteering_analysis::{
    ClassResult, EventId, PersonId, PersonRaceResult, PersonResult, Punch, RaceData,
    ResultListAggregate, ResultListId, RunnerSplitRecord,
};

/// Runners per generated class
const RUNNERS_PER_CLASS: usize = 40;

/// Legs per generated course (start leg and finish leg included)
const LEGS_PER_COURSE: usize = 14;

/// First start of a generated event (epoch seconds)
const FIRST_START_EPOCH: i64 = 1_750_000_000;

/// Predefined event sizes for benchmark scenarios
#[derive(Debug, Clone, Copy)]
pub enum EventSize {
    /// Small event (2 classes, 80 runners)
    Small,
    /// Regional event (10 classes, 400 runners)
    Medium,
    /// Championship-size event (40 classes, 1600 runners)
    Large,
}

impl EventSize {
    #[must_use]
    pub const fn classes(self) -> usize {
        match self {
            Self::Small => 2,
            Self::Medium => 10,
            Self::Large => 40,
        }
    }

    #[must_use]
    pub const fn runners(self) -> usize {
        self.classes() * RUNNERS_PER_CLASS
    }
}

/// Control code of a course position; positions 4-8 are shared by every class
fn control_code(class_index: usize, position: usize) -> String {
    if (4..=8).contains(&position) {
        format!("{}", 100 + position)
    } else {
        format!("{}", 200 + class_index * 20 + position)
    }
}

/// Deterministic leg durations with occasional mistakes and one cut leg per class
#[allow(clippy::cast_precision_loss)]
fn leg_durations(class_index: usize, runner_index: usize) -> Vec<f64> {
    let factor = 1.0 + ((runner_index * 13 + class_index * 7) % 45) as f64 / 100.0;
    (0..LEGS_PER_COURSE)
        .map(|leg| {
            let base = 90.0 + ((leg * 37 + class_index * 11) % 180) as f64;
            let mistake = if (runner_index * 7 + leg) % 23 == 0 { 1.8 } else { 1.0 };
            let cut = if runner_index == 5 && leg == 6 { 0.3 } else { 1.0 };
            base * factor * mistake * cut
        })
        .collect()
}

/// Generate an event and its split records
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn generate_event(size: EventSize) -> (ResultListAggregate, Vec<RunnerSplitRecord>) {
    let mut class_results = Vec::with_capacity(size.classes());
    let mut splits = Vec::with_capacity(size.runners());

    for class_index in 0..size.classes() {
        let class_name = format!("C{class_index:02}");
        let mut person_results = Vec::with_capacity(RUNNERS_PER_CLASS);

        for runner_index in 0..RUNNERS_PER_CLASS {
            let person_id = PersonId((class_index * RUNNERS_PER_CLASS + runner_index) as i64);
            let legs = leg_durations(class_index, runner_index);
            // Classes start interleaved, two minutes apart within a class
            let offset = (runner_index * 120 + class_index * 7) as i64;
            let start_time = DateTime::<Utc>::from_timestamp(FIRST_START_EPOCH + offset, 0);

            let mut elapsed = 0.0;
            let punches = legs[..LEGS_PER_COURSE - 1]
                .iter()
                .enumerate()
                .map(|(position, leg)| {
                    elapsed += leg;
                    Punch::new(control_code(class_index, position), elapsed)
                })
                .collect();

            person_results.push(PersonResult {
                person_id,
                race_results: vec![PersonRaceResult {
                    race_number: 1,
                    runtime_seconds: Some(legs.iter().sum()),
                    start_time,
                }],
            });
            splits.push(RunnerSplitRecord::new(person_id, class_name.clone(), 1, punches));
        }

        class_results.push(ClassResult {
            class_name,
            person_results,
        });
    }

    let result_list = ResultListAggregate {
        result_list_id: ResultListId(1),
        event_id: EventId(1),
        class_results,
    };
    (result_list, splits)
}

/// Generate a frozen race snapshot
#[must_use]
pub fn generate_race(size: EventSize) -> RaceData {
    let (result_list, splits) = generate_event(size);
    RaceData::new(&result_list, splits)
}
