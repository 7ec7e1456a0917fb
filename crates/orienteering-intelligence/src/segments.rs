// ABOUTME: Segment builder turning a runner's punches into timed control-to-control legs
// ABOUTME: Inserts the virtual start and finish and drops non-positive or incomplete pairs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use orienteering_core::models::{ControlPoint, Punch};
use serde::{Deserialize, Serialize};

/// Identity of a segment for reference-time lookups
///
/// `class_name == None` is the cross-class key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentKey {
    /// Class the pool belongs to, `None` for the cross-class pool
    pub class_name: Option<String>,
    /// Control the segment starts at
    pub from: ControlPoint,
    /// Control the segment ends at
    pub to: ControlPoint,
}

impl SegmentKey {
    /// Class-specific key
    #[must_use]
    pub fn for_class(class_name: &str, from: &ControlPoint, to: &ControlPoint) -> Self {
        Self {
            class_name: Some(class_name.to_owned()),
            from: from.clone(),
            to: to.clone(),
        }
    }

    /// Cross-class key
    #[must_use]
    pub fn cross_class(from: &ControlPoint, to: &ControlPoint) -> Self {
        Self {
            class_name: None,
            from: from.clone(),
            to: to.clone(),
        }
    }
}

/// A timed leg between two consecutive controls of one runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTime {
    /// 1-based leg number in course order
    pub leg_number: u32,
    /// Control the leg starts at
    pub from: ControlPoint,
    /// Control the leg ends at
    pub to: ControlPoint,
    /// Leg duration in seconds, always > 0
    pub duration_seconds: f64,
    /// Elapsed seconds since start when `to` was punched
    pub split_seconds: f64,
}

impl SegmentTime {
    /// Leg leaving the virtual start
    #[must_use]
    pub const fn is_start_leg(&self) -> bool {
        self.from.is_start()
    }

    /// Leg entering the virtual finish
    #[must_use]
    pub const fn is_finish_leg(&self) -> bool {
        self.to.is_finish()
    }

    /// Neither the start leg nor the finish leg
    #[must_use]
    pub const fn is_inner_leg(&self) -> bool {
        !self.is_start_leg() && !self.is_finish_leg()
    }

    /// Class-specific lookup key
    #[must_use]
    pub fn class_key(&self, class_name: &str) -> SegmentKey {
        SegmentKey::for_class(class_name, &self.from, &self.to)
    }

    /// Cross-class lookup key
    #[must_use]
    pub fn cross_class_key(&self) -> SegmentKey {
        SegmentKey::cross_class(&self.from, &self.to)
    }
}

/// Output of the segment builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentBuild {
    /// Valid segments in course order
    pub segments: Vec<SegmentTime>,
    /// Consecutive pairs dropped for a missing time or a non-positive duration
    pub dropped_pairs: usize,
}

/// Build a runner's segments from punches and an optional finish runtime
///
/// Points are the virtual start at t = 0, every punch, and the virtual finish
/// at t = runtime when the runtime is positive. They are ordered by punch time
/// with missing times last; a segment is emitted for every consecutive pair
/// whose times are both known and strictly increasing. Leg numbers follow pair
/// positions, so a dropped pair leaves a gap in the numbering.
#[must_use]
pub fn build_segments(punches: &[Punch], runtime_seconds: Option<f64>) -> SegmentBuild {
    let mut points: Vec<(ControlPoint, Option<f64>)> = Vec::with_capacity(punches.len() + 2);
    points.push((ControlPoint::Start, Some(0.0)));
    points.extend(
        punches
            .iter()
            .map(|punch| (ControlPoint::control(&punch.control_code), punch.punch_time_seconds)),
    );
    if let Some(runtime) = runtime_seconds.filter(|runtime| *runtime > 0.0) {
        points.push((ControlPoint::Finish, Some(runtime)));
    }

    // Stable: equal times keep course order
    points.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    points
        .windows(2)
        .zip(1_u32..)
        .fold(SegmentBuild::default(), |mut build, (pair, leg_number)| {
            let (from, from_time) = &pair[0];
            let (to, to_time) = &pair[1];
            match (from_time, to_time) {
                (Some(start), Some(end)) if end - start > 0.0 => {
                    build.segments.push(SegmentTime {
                        leg_number,
                        from: from.clone(),
                        to: to.clone(),
                        duration_seconds: end - start,
                        split_seconds: *end,
                    });
                }
                _ => build.dropped_pairs += 1,
            }
            build
        })
}
