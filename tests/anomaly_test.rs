// ABOUTME: Integration tests for the robust course-cutting (anomaly) analyzer
// ABOUTME: Covers self-excluded references, class gates, cross-class fallback and determinism
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    clippy::float_cmp,
    clippy::unreadable_literal,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

mod common;

use common::{cutting_event, scaled, CUTTING_COURSE};
use orienteering_analysis::{
    AnalysisPolicy, AnomalyAnalyzer, CancellationToken, PersonFilter, PersonId, RaceAnalyzer,
    SuspicionLevel,
};
use orienteering_intelligence::{PoolSource, ReferenceMethod};

#[test]
fn test_course_cutter_is_flagged_high() {
    common::init_test_logging();
    let policy = AnalysisPolicy::default();
    let race = cutting_event().race();

    let analysis = AnomalyAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();
    assert_eq!(analysis.runner_profiles.len(), 6);

    let cutter = analysis
        .runner_profiles
        .iter()
        .find(|profile| profile.person_id == PersonId(1))
        .unwrap();
    assert_eq!(cutter.classification, SuspicionLevel::HighSuspicion);
    assert_eq!(cutter.flagged_segments.len(), 1);

    let segment = cutter.representative.as_ref().unwrap();
    assert_eq!(segment.leg_number, 3);
    assert_eq!(segment.reference_source, PoolSource::Class);
    assert_eq!(segment.reference_method, ReferenceMethod::TopMedian);
    // Median of the three fastest remaining times 300, 306, 315
    assert!((segment.cleaned_reference_seconds - 306.0).abs() < 1e-9);
    assert!((segment.time_difference_seconds - 246.0).abs() < 1e-9);
    assert!(segment.pi_real < 0.2);
    assert!(cutter.class_context.reliable_data);
}

#[test]
fn test_honest_runners_are_not_flagged() {
    let policy = AnalysisPolicy::default();
    let race = cutting_event().race();

    let analysis = AnomalyAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();

    for profile in analysis
        .runner_profiles
        .iter()
        .filter(|profile| profile.person_id != PersonId(1))
    {
        assert_eq!(
            profile.classification,
            SuspicionLevel::NoSuspicion,
            "person {} flagged",
            profile.person_id
        );
        assert!(profile.representative.is_none());
    }

    let statistics = analysis.statistics.unwrap();
    assert_eq!(statistics.total_runners, 6);
    assert_eq!(statistics.reliable_runners, 6);
    assert_eq!(statistics.flagged_segment_count, 1);
    assert_eq!(
        statistics.runners_by_classification[&SuspicionLevel::HighSuspicion],
        1
    );
    assert_eq!(
        statistics.runners_by_classification[&SuspicionLevel::NoSuspicion],
        5
    );
}

#[test]
fn test_small_class_is_omitted() {
    let policy = AnalysisPolicy::default();
    let race = cutting_event()
        .runner(50, "D45", 0, &CUTTING_COURSE)
        .runner(51, "D45", 60, &scaled(&CUTTING_COURSE, 1.2))
        .race();

    let analysis = AnomalyAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();

    assert_eq!(analysis.runner_profiles.len(), 6);
    assert!(analysis
        .runner_profiles
        .iter()
        .all(|profile| profile.class_name == "H21"));
}

#[test]
fn test_small_class_pool_falls_back_to_cross_class() {
    let policy = AnalysisPolicy::default();
    let mut cutter = CUTTING_COURSE.to_vec();
    cutter[2] = 60.0;
    let race = cutting_event()
        .runner(40, "H20", 30, &cutter)
        .runner(41, "H20", 150, &CUTTING_COURSE)
        .runner(42, "H20", 270, &scaled(&CUTTING_COURSE, 1.03))
        .runner(43, "H20", 390, &scaled(&CUTTING_COURSE, 1.06))
        .race();

    let analysis = AnomalyAnalyzer::new(&policy)
        .analyze(
            &race,
            &PersonFilter::only([PersonId(40)]),
            &CancellationToken::new(),
        )
        .unwrap();

    let profile = &analysis.runner_profiles[0];
    assert!(!profile.class_context.reliable_data);
    assert_eq!(profile.classification, SuspicionLevel::HighSuspicion);

    let segment = profile.representative.as_ref().unwrap();
    assert_eq!(segment.reference_source, PoolSource::CrossClass);
    assert!((segment.cleaned_reference_seconds - 300.0).abs() < 1e-9);
}

#[test]
fn test_filter_restricts_profiles_but_not_references() {
    let policy = AnalysisPolicy::default();
    let race = cutting_event().race();
    let analyzer = AnomalyAnalyzer::new(&policy);

    let full = analyzer
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();
    let filtered = analyzer
        .analyze(
            &race,
            &PersonFilter::only([PersonId(1)]),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(filtered.runner_profiles.len(), 1);
    let from_full = full
        .runner_profiles
        .iter()
        .find(|profile| profile.person_id == PersonId(1))
        .unwrap();
    assert_eq!(&filtered.runner_profiles[0], from_full);
}

#[test]
fn test_repeated_runs_serialize_identically() {
    let policy = AnalysisPolicy::default();
    let race = cutting_event().race();
    let analyzer = AnomalyAnalyzer::new(&policy);

    let first = analyzer
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();
    let second = analyzer
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_cancelled_token_stops_analysis() {
    let policy = AnalysisPolicy::default();
    let race = cutting_event().race();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = AnomalyAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &cancel)
        .unwrap_err();
    assert_eq!(
        error.code,
        orienteering_analysis::errors::ErrorCode::AnalysisCancelled
    );
}
