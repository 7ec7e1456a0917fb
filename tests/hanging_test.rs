// ABOUTME: Integration tests for the hanging (drafting) detector
// ABOUTME: Covers cross-class drivers, the proximity window and iterative baseline refinement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::float_cmp, clippy::missing_panics_doc, clippy::too_many_lines)]

mod common;

use common::drafting_event;
use orienteering_analysis::{
    AnalysisPolicy, CancellationToken, HangingAnalyzer, HangingClassification, HangingProfile,
    PersonFilter, PersonId, RaceAnalyzer,
};

fn passenger(policy: &AnalysisPolicy, driver_start_offset: i64) -> HangingProfile {
    let race = drafting_event(driver_start_offset).race();
    let analysis = HangingAnalyzer::new(policy)
        .analyze(
            &race,
            &PersonFilter::only([PersonId(10)]),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(analysis.runner_profiles.len(), 1);
    analysis.runner_profiles.into_iter().next().unwrap()
}

#[test]
fn test_drafted_legs_are_detected_across_classes() {
    common::init_test_logging();
    let policy = AnalysisPolicy::default();
    let profile = passenger(&policy, 10);

    assert_eq!(profile.classification, HangingClassification::HighHanging);
    assert_eq!(profile.eligible_segment_count, 4);
    assert_eq!(profile.hanging_segment_count, 2);
    assert!((profile.hanging_percentage - 50.0).abs() < 1e-9);
    assert_eq!(profile.pairs.len(), 2);

    for pair in &profile.pairs {
        assert_eq!(pair.driver_person_id, PersonId(20));
        assert_eq!(pair.driver_class_name, "D21");
        assert!(pair.time_gap_seconds >= 0.0);
        assert!(pair.time_gap_seconds <= policy.hanging.proximity_window_seconds);
        assert!(pair.driver_pi < pair.passenger_pi);
        assert!(pair.hanging_index <= policy.hanging.hanging_index_threshold);
    }

    let legs: Vec<u32> = profile.pairs.iter().map(|pair| pair.leg_number).collect();
    assert_eq!(legs, vec![2, 3]);
    assert!((profile.pairs[0].time_gap_seconds - 20.0).abs() < 1e-9);
    assert!((profile.pairs[1].time_gap_seconds - 25.0).abs() < 1e-9);
}

#[test]
fn test_baseline_refinement_converges_above_naive() {
    let policy = AnalysisPolicy::default();
    let profile = passenger(&policy, 10);

    let naive = profile.naive_normal_pi.unwrap();
    let refined = profile.normal_pi.unwrap();
    // Diffs 20, 0, 0, 30, 40, 50: median 25 with the drafted legs, 35 without
    assert!((naive - 1.25).abs() < 1e-9);
    assert!((refined - 1.35).abs() < 1e-9);
    assert!(refined > naive);
    assert!(profile.converged);
    assert_eq!(profile.iterations, 2);
    assert!(profile.iterations <= policy.hanging.max_iterations);
}

#[test]
fn test_runner_punching_after_passenger_is_not_a_driver() {
    let policy = AnalysisPolicy::default();
    let profile = passenger(&policy, 100);

    assert_eq!(profile.classification, HangingClassification::NoHanging);
    assert!(profile.pairs.is_empty());
    assert_eq!(profile.iterations, 1);
    assert!(profile.converged);
    assert_eq!(profile.normal_pi, profile.naive_normal_pi);
}

#[test]
fn test_narrow_window_excludes_driver() {
    let mut policy = AnalysisPolicy::default();
    policy.hanging.proximity_window_seconds = 15.0;
    let profile = passenger(&policy, 10);

    assert!(profile.pairs.is_empty());
    assert_eq!(profile.classification, HangingClassification::NoHanging);
}

#[test]
fn test_every_selected_runner_gets_a_profile() {
    let policy = AnalysisPolicy::default();
    let race = drafting_event(10).race();

    let analysis = HangingAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();
    assert_eq!(analysis.runner_profiles.len(), 6);

    // D21 has two runners: below the class gate
    for profile in analysis
        .runner_profiles
        .iter()
        .filter(|profile| profile.class_name == "D21")
    {
        assert_eq!(
            profile.classification,
            HangingClassification::InsufficientData
        );
        assert!(profile.normal_pi.is_none());
        assert_eq!(profile.iterations, 0);
    }

    // Par runners draft nobody
    for person in [11, 12, 13] {
        let profile = analysis
            .runner_profiles
            .iter()
            .find(|profile| profile.person_id == PersonId(person))
            .unwrap();
        assert_eq!(profile.classification, HangingClassification::NoHanging);
    }

    let statistics = analysis.statistics.unwrap();
    assert_eq!(statistics.total_runners, 6);
    assert_eq!(statistics.total_pairs, 2);
    assert_eq!(
        statistics.runners_by_classification[&HangingClassification::InsufficientData],
        2
    );
    assert_eq!(
        statistics.runners_by_classification[&HangingClassification::HighHanging],
        1
    );
    assert!(statistics.mean_hanging_index.is_some());
}

#[test]
fn test_single_iteration_cap_stops_refinement() {
    let mut policy = AnalysisPolicy::default();
    policy.hanging.max_iterations = 1;
    let profile = passenger(&policy, 10);

    assert_eq!(profile.iterations, 1);
    assert!(!profile.converged);
    assert_eq!(profile.hanging_segment_count, 2);
    assert_eq!(profile.normal_pi, profile.naive_normal_pi);
}

#[test]
fn test_too_few_clean_legs_keeps_last_pass() {
    let mut policy = AnalysisPolicy::default();
    // Six legs qualify; removing the two drafted legs leaves four
    policy.baseline.min_clean_segments = 5;
    let profile = passenger(&policy, 10);

    assert_eq!(profile.iterations, 1);
    assert!(!profile.converged);
    assert!((profile.naive_normal_pi.unwrap() - 1.25).abs() < 1e-9);
    assert_eq!(profile.normal_pi, profile.naive_normal_pi);

    let legs: Vec<u32> = profile.pairs.iter().map(|pair| pair.leg_number).collect();
    assert_eq!(legs, vec![2, 3]);
    assert!(profile
        .pairs
        .iter()
        .all(|pair| (pair.hanging_index - pair.passenger_pi / 1.25).abs() < 1e-9));
    assert_eq!(profile.classification, HangingClassification::HighHanging);
}
