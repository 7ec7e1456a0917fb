// ABOUTME: Shared test utilities and fixture builders for integration tests
// ABOUTME: Builds synthetic result lists and split records on a common race clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    clippy::expect_used
)]
//! Shared test utilities for `orienteering_analysis`
//!
//! Runners are described by their leg durations over the controls
//! `31, 32, ...`; the last leg always ends at the virtual finish.

use chrono::{DateTime, Utc};
use orienteering_analysis::repositories::{
    InMemoryResultListRepository, InMemorySplitTimeRepository, SplitTimeRepository,
};
use orienteering_analysis::services::AnalysisService;
use orienteering_analysis::{
    AnalysisPolicy, ClassResult, EventId, PersonId, PersonRaceResult, PersonResult, Punch,
    RaceData, ResultListAggregate, ResultListId, RunnerSplitRecord,
};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// First start of every fixture event (epoch seconds)
pub const FIRST_START_EPOCH: i64 = 1_750_000_000;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Multiply every leg duration by a factor
pub fn scaled(legs: &[f64], factor: f64) -> Vec<f64> {
    legs.iter().map(|leg| leg * factor).collect()
}

/// Synthetic event: one race, any number of classes
#[derive(Debug, Clone)]
pub struct EventFixture {
    result_list_id: ResultListId,
    event_id: EventId,
    classes: Vec<ClassResult>,
    splits: Vec<RunnerSplitRecord>,
}

impl EventFixture {
    pub fn new(result_list_id: i64) -> Self {
        Self {
            result_list_id: ResultListId(result_list_id),
            event_id: EventId(result_list_id * 10),
            classes: Vec::new(),
            splits: Vec::new(),
        }
    }

    pub fn result_list_id(&self) -> ResultListId {
        self.result_list_id
    }

    /// Add a finished runner starting `start_offset_seconds` after the first start
    pub fn runner(
        mut self,
        person_id: i64,
        class_name: &str,
        start_offset_seconds: i64,
        legs: &[f64],
    ) -> Self {
        let start_time = DateTime::<Utc>::from_timestamp(FIRST_START_EPOCH + start_offset_seconds, 0)
            .expect("valid fixture start time");
        let runtime: f64 = legs.iter().sum();
        self.add_result(
            person_id,
            class_name,
            PersonRaceResult {
                race_number: 1,
                runtime_seconds: Some(runtime),
                start_time: Some(start_time),
            },
        );

        let punches = legs
            .iter()
            .take(legs.len().saturating_sub(1))
            .scan(0.0, |elapsed, leg| {
                *elapsed += leg;
                Some(*elapsed)
            })
            .enumerate()
            .map(|(index, elapsed)| Punch::new((31 + index).to_string(), elapsed))
            .collect();
        self.splits.push(RunnerSplitRecord::new(
            PersonId(person_id),
            class_name,
            1,
            punches,
        ));
        self
    }

    /// Add a result-list entry without any split record
    pub fn result_only(mut self, person_id: i64, class_name: &str, runtime_seconds: f64) -> Self {
        self.add_result(
            person_id,
            class_name,
            PersonRaceResult {
                race_number: 1,
                runtime_seconds: Some(runtime_seconds),
                start_time: None,
            },
        );
        self
    }

    fn add_result(&mut self, person_id: i64, class_name: &str, race: PersonRaceResult) {
        let person = PersonResult {
            person_id: PersonId(person_id),
            race_results: vec![race],
        };
        match self
            .classes
            .iter_mut()
            .find(|class| class.class_name == class_name)
        {
            Some(class) => class.person_results.push(person),
            None => self.classes.push(ClassResult {
                class_name: class_name.to_owned(),
                person_results: vec![person],
            }),
        }
    }

    pub fn result_list(&self) -> ResultListAggregate {
        ResultListAggregate {
            result_list_id: self.result_list_id,
            event_id: self.event_id,
            class_results: self.classes.clone(),
        }
    }

    pub fn splits(&self) -> Vec<RunnerSplitRecord> {
        self.splits.clone()
    }

    pub fn race(&self) -> RaceData {
        RaceData::new(&self.result_list(), self.splits())
    }

    /// Service over in-memory stores holding this event
    pub fn service(&self, policy: AnalysisPolicy) -> AnalysisService {
        let result_lists = Arc::new(InMemoryResultListRepository::new());
        result_lists.insert(self.result_list());
        let split_store = InMemorySplitTimeRepository::new();
        split_store.insert(self.result_list_id, self.splits());
        let splits: Arc<dyn SplitTimeRepository> = Arc::new(split_store);
        AnalysisService::new(result_lists, Some(splits), policy)
    }

    /// Service whose result-list store knows this event but no split store is configured
    pub fn service_without_splits(&self, policy: AnalysisPolicy) -> AnalysisService {
        let result_lists = Arc::new(InMemoryResultListRepository::new());
        result_lists.insert(self.result_list());
        AnalysisService::new(result_lists, None, policy)
    }
}

/// Base course of the course-cutting fixture: start leg, four inner legs, finish leg
pub const CUTTING_COURSE: [f64; 6] = [60.0, 200.0, 300.0, 250.0, 180.0, 30.0];

/// Six H21 runners: person 1 cuts leg 3, person 3 runs leg 4 unusually fast
pub fn cutting_event() -> EventFixture {
    let mut cutter = CUTTING_COURSE.to_vec();
    cutter[2] = 60.0;
    let mut quick = scaled(&CUTTING_COURSE, 1.02);
    quick[3] = 200.0;

    EventFixture::new(1)
        .runner(1, "H21", 0, &cutter)
        .runner(2, "H21", 120, &CUTTING_COURSE)
        .runner(3, "H21", 240, &quick)
        .runner(4, "H21", 360, &scaled(&CUTTING_COURSE, 1.05))
        .runner(5, "H21", 480, &scaled(&CUTTING_COURSE, 1.08))
        .runner(6, "H21", 600, &scaled(&CUTTING_COURSE, 1.10))
}

/// Drafting fixture
///
/// Person 10 (H21) runs 20-50% over par except legs 2 and 3, where they punch
/// 20 s and 25 s behind person 20 (D21). Persons 11-13 run every leg at par
/// (100 s). The D21 pair gives person 20 a PI below 1.0 on every leg.
/// `driver_start_offset` is person 20's start relative to person 10.
pub fn drafting_event(driver_start_offset: i64) -> EventFixture {
    let par = [100.0; 6];
    EventFixture::new(2)
        .runner(10, "H21", 0, &[120.0, 100.0, 100.0, 130.0, 140.0, 150.0])
        .runner(11, "H21", 1_000, &par)
        .runner(12, "H21", 2_000, &par)
        .runner(13, "H21", 3_000, &par)
        .runner(20, "D21", driver_start_offset, &[95.0; 6])
        .runner(21, "D21", 3_600, &[110.0; 6])
}

/// Mental resilience fixture
///
/// Person 30 makes a mistake on leg 3 and recovers fast on leg 4, then makes
/// back-to-back mistakes on legs 6 and 7 before the finish leg.
pub fn resilience_event() -> EventFixture {
    let par = [100.0; 8];
    EventFixture::new(3)
        .runner(
            30,
            "H21",
            0,
            &[100.0, 100.0, 180.0, 85.0, 100.0, 190.0, 200.0, 100.0],
        )
        .runner(31, "H21", 600, &par)
        .runner(32, "H21", 1_200, &par)
        .runner(33, "H21", 1_800, &par)
}
