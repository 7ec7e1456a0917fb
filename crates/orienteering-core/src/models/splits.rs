// ABOUTME: Split-time input models: control points, punches and per-runner split records
// ABOUTME: Virtual start/finish controls are first-class variants rather than magic codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::PersonId;
use crate::constants::controls::{FINISH_CODE, START_CODE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on a runner's course: the virtual start, a real control, or the virtual finish
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPoint {
    /// Virtual start control at t = 0
    Start,
    /// Real control identified by its code
    Control(String),
    /// Virtual finish control at t = finish runtime
    Finish,
}

impl ControlPoint {
    /// Build a real control point from its code
    pub fn control(code: impl Into<String>) -> Self {
        Self::Control(code.into())
    }

    /// Whether this is the virtual start
    #[must_use]
    pub const fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Whether this is the virtual finish
    #[must_use]
    pub const fn is_finish(&self) -> bool {
        matches!(self, Self::Finish)
    }

    /// Code of a real control, `None` for the virtual start and finish
    #[must_use]
    pub fn control_code(&self) -> Option<&str> {
        match self {
            Self::Control(code) => Some(code),
            Self::Start | Self::Finish => None,
        }
    }

    /// Display code (`S`, the control code, or `F`)
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Start => START_CODE,
            Self::Control(code) => code,
            Self::Finish => FINISH_CODE,
        }
    }
}

impl fmt::Display for ControlPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One control punch; the time is seconds since the runner's start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Punch {
    /// Control code as printed on the map
    pub control_code: String,
    /// Seconds since start, `None` for a missing punch
    pub punch_time_seconds: Option<f64>,
}

impl Punch {
    /// Create a punch at a known time
    pub fn new(control_code: impl Into<String>, punch_time_seconds: f64) -> Self {
        Self {
            control_code: control_code.into(),
            punch_time_seconds: Some(punch_time_seconds),
        }
    }

    /// Create a missing punch
    pub fn missing(control_code: impl Into<String>) -> Self {
        Self {
            control_code: control_code.into(),
            punch_time_seconds: None,
        }
    }
}

/// A runner's ordered punches for one race of a result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSplitRecord {
    /// Runner
    pub person_id: PersonId,
    /// Class (course category) the runner started in
    pub class_name: String,
    /// Race number for multi-race events (1 for single races)
    pub race_number: u32,
    /// Punches in course order
    pub punches: Vec<Punch>,
}

impl RunnerSplitRecord {
    /// Create a split record
    pub fn new(
        person_id: PersonId,
        class_name: impl Into<String>,
        race_number: u32,
        punches: Vec<Punch>,
    ) -> Self {
        Self {
            person_id,
            class_name: class_name.into(),
            race_number,
            punches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_controls_order_around_real_controls() {
        let mut points = vec![
            ControlPoint::Finish,
            ControlPoint::control("31"),
            ControlPoint::Start,
        ];
        points.sort();
        assert_eq!(points[0], ControlPoint::Start);
        assert_eq!(points[2], ControlPoint::Finish);
        assert_eq!(points[1].to_string(), "31");
    }
}
