// ABOUTME: Integration tests for the mental resilience analyzer
// ABOUTME: Covers reaction pairing, chain errors, the finish leg and aggregate statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::float_cmp, clippy::missing_panics_doc)]

mod common;

use common::resilience_event;
use orienteering_analysis::{
    AnalysisPolicy, CancellationToken, MentalResilienceAnalyzer, PersonFilter, PersonId,
    RaceAnalyzer, ResilienceClassification,
};

#[test]
fn test_fast_reaction_after_mistake_is_panic() {
    common::init_test_logging();
    let policy = AnalysisPolicy::default();
    let race = resilience_event().race();

    let analysis = MentalResilienceAnalyzer::new(&policy)
        .analyze(
            &race,
            &PersonFilter::only([PersonId(30)]),
            &CancellationToken::new(),
        )
        .unwrap();
    let profile = &analysis.runner_profiles[0];

    assert!((profile.normal_pi - 1.0).abs() < 1e-9);
    assert_eq!(profile.mistake_count, 3);
    assert_eq!(profile.reactions.len(), 2);

    let first = &profile.reactions[0];
    assert_eq!(first.mistake.leg_number, 3);
    assert_eq!(first.reaction_leg_number, 4);
    // 85 s against a reference of 95 s (mean of 85, 100, 100)
    assert!((first.mri - 85.0 / 95.0).abs() < 1e-9);
    assert_eq!(first.classification, ResilienceClassification::Panic);

    assert_eq!(profile.classification, Some(ResilienceClassification::Panic));
    assert!((profile.average_mri.unwrap() - 85.0 / 95.0).abs() < 1e-9);
}

#[test]
fn test_back_to_back_mistakes_are_chain_errors() {
    let policy = AnalysisPolicy::default();
    let race = resilience_event().race();

    let analysis = MentalResilienceAnalyzer::new(&policy)
        .analyze(
            &race,
            &PersonFilter::only([PersonId(30)]),
            &CancellationToken::new(),
        )
        .unwrap();
    let profile = &analysis.runner_profiles[0];

    let chain = &profile.reactions[1];
    assert_eq!(chain.mistake.leg_number, 6);
    assert_eq!(chain.reaction_leg_number, 7);
    assert_eq!(chain.classification, ResilienceClassification::ChainError);

    // Leg 7 is followed only by the finish leg
    let unreacted = profile.unreacted_mistake.as_ref().unwrap();
    assert_eq!(unreacted.leg_number, 7);
}

#[test]
fn test_runners_without_mistakes_have_no_classification() {
    let policy = AnalysisPolicy::default();
    let race = resilience_event().race();

    let analysis = MentalResilienceAnalyzer::new(&policy)
        .analyze(&race, &PersonFilter::all(), &CancellationToken::new())
        .unwrap();
    assert_eq!(analysis.runner_profiles.len(), 4);

    for profile in analysis
        .runner_profiles
        .iter()
        .filter(|profile| profile.person_id != PersonId(30))
    {
        assert_eq!(profile.mistake_count, 0);
        assert!(profile.reactions.is_empty());
        assert!(profile.classification.is_none());
        assert!(profile.average_mri.is_none());
        assert!(!profile.class_context.reliable_data);
    }

    let statistics = analysis.statistics.unwrap();
    assert_eq!(statistics.total_runners, 4);
    assert_eq!(statistics.runners_without_reactions, 3);
    assert_eq!(
        statistics.runners_by_classification[&ResilienceClassification::Panic],
        1
    );
    assert_eq!(
        statistics.reactions_by_classification[&ResilienceClassification::ChainError],
        1
    );
    assert!((statistics.mean_mri.unwrap() - 85.0 / 95.0).abs() < 1e-9);
}

#[test]
fn test_custom_cut_points_change_bucket() {
    let mut policy = AnalysisPolicy::default();
    policy.mental_resilience.panic_below = 0.80;
    let race = resilience_event().race();

    let analysis = MentalResilienceAnalyzer::new(&policy)
        .analyze(
            &race,
            &PersonFilter::only([PersonId(30)]),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(
        analysis.runner_profiles[0].classification,
        Some(ResilienceClassification::IceMan)
    );
}
