// ABOUTME: Result-list aggregate: per-class, per-person race results with runtimes
// ABOUTME: Supplies finish runtimes (virtual finish) and start times (cross-runner punch index)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{EventId, PersonId, ResultListId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored result list with its class results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultListAggregate {
    /// Result list identifier
    pub result_list_id: ResultListId,
    /// Event the result list belongs to
    pub event_id: EventId,
    /// Results grouped by class
    pub class_results: Vec<ClassResult>,
}

/// Results of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResult {
    /// Class name
    pub class_name: String,
    /// Results of every person who started in the class
    pub person_results: Vec<PersonResult>,
}

/// Results of one person in a class (one entry per race)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonResult {
    /// Runner
    pub person_id: PersonId,
    /// One result per race of the event
    pub race_results: Vec<PersonRaceResult>,
}

/// A person's result in a single race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRaceResult {
    /// Race number
    pub race_number: u32,
    /// Finish runtime in seconds, `None` when not finished
    pub runtime_seconds: Option<f64>,
    /// Recorded start time (needed to place punches on a common clock)
    pub start_time: Option<DateTime<Utc>>,
}

impl ResultListAggregate {
    /// Look up one person's race result within a class
    #[must_use]
    pub fn race_result(
        &self,
        class_name: &str,
        person_id: PersonId,
        race_number: u32,
    ) -> Option<&PersonRaceResult> {
        self.class_results
            .iter()
            .filter(|class| class.class_name == class_name)
            .flat_map(|class| &class.person_results)
            .filter(|person| person.person_id == person_id)
            .flat_map(|person| &person.race_results)
            .find(|race| race.race_number == race_number)
    }
}
