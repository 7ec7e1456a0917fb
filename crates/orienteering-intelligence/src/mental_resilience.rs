// ABOUTME: Mental resilience analyzer scoring the leg run right after each navigation mistake
// ABOUTME: Buckets reactions into panic, ice man and resigner; consecutive mistakes are chain errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Mental Resilience Analyzer
//!
//! Mistakes come from the baseline engine's mistake scan. The Mental
//! Resilience Index (MRI) of a mistake is the PI of the following leg divided
//! by the runner's Normal PI. A reaction leg must start where the mistake leg
//! ended and must not be the finish leg.

use crate::analysis::{
    map_runners, qualify_runner, Analysis, AnalysisKind, CancellationToken, ClassContext,
    RaceAnalyzer,
};
use crate::config::{AnalysisPolicy, MentalResiliencePolicy};
use crate::performance::SegmentPerformance;
use crate::race::{PersonFilter, RaceData, RunnerRace};
use crate::reference_times::ReferenceTimes;
use crate::statistics::{mean, median};
use orienteering_core::errors::AppResult;
use orienteering_core::models::{ControlPoint, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reaction to a mistake
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResilienceClassification {
    /// Rushed the next leg
    Panic,
    /// Ran the next leg at the usual level
    IceMan,
    /// Lost pace on the next leg
    Resigner,
    /// The next leg was a mistake as well
    ChainError,
}

impl ResilienceClassification {
    /// Bucket an MRI value
    #[must_use]
    pub fn from_mri(mri: f64, policy: &MentalResiliencePolicy) -> Self {
        if mri < policy.panic_below {
            Self::Panic
        } else if mri > policy.resigner_above {
            Self::Resigner
        } else {
            Self::IceMan
        }
    }
}

/// A leg identified as a mistake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeSegment {
    /// Leg number
    pub leg_number: u32,
    /// Start control
    pub from: ControlPoint,
    /// End control
    pub to: ControlPoint,
    /// PI on the leg
    pub performance_index: f64,
    /// Seconds lost against the reference
    pub loss_seconds: f64,
}

impl From<&SegmentPerformance> for MistakeSegment {
    fn from(performance: &SegmentPerformance) -> Self {
        Self {
            leg_number: performance.segment.leg_number,
            from: performance.segment.from.clone(),
            to: performance.segment.to.clone(),
            performance_index: performance.performance_index,
            loss_seconds: performance.loss_seconds(),
        }
    }
}

/// A mistake and the leg run right after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeReactionPair {
    /// The mistake
    pub mistake: MistakeSegment,
    /// Leg number of the reaction
    pub reaction_leg_number: u32,
    /// End control of the reaction leg
    pub reaction_to: ControlPoint,
    /// PI on the reaction leg
    pub reaction_pi: f64,
    /// Reaction PI / Normal PI
    pub mri: f64,
    /// Classification of the reaction
    pub classification: ResilienceClassification,
}

/// A runner's mental resilience profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalResilienceProfile {
    /// Runner
    pub person_id: PersonId,
    /// Class
    pub class_name: String,
    /// Race number
    pub race_number: u32,
    /// Class size context
    #[serde(flatten)]
    pub class_context: ClassContext,
    /// Personal baseline
    pub normal_pi: f64,
    /// Mistakes found by the baseline scan
    pub mistake_count: usize,
    /// Scored reactions, in course order
    pub reactions: Vec<MistakeReactionPair>,
    /// Mean MRI over reactions that are not chain errors
    pub average_mri: Option<f64>,
    /// Bucket of the average MRI; chain error when only chain errors were seen
    pub classification: Option<ResilienceClassification>,
    /// Last mistake when it had no scoreable reaction
    pub unreacted_mistake: Option<MistakeSegment>,
}

/// Aggregate mental resilience statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentalResilienceStatistics {
    /// Profiles in the analysis
    pub total_runners: usize,
    /// Runners per classification
    pub runners_by_classification: BTreeMap<ResilienceClassification, usize>,
    /// Runners without any scored reaction
    pub runners_without_reactions: usize,
    /// Reactions per classification
    pub reactions_by_classification: BTreeMap<ResilienceClassification, usize>,
    /// Mean MRI over individual reactions that are not chain errors
    pub mean_mri: Option<f64>,
    /// Median MRI over individual reactions that are not chain errors
    pub median_mri: Option<f64>,
}

impl MentalResilienceStatistics {
    /// Aggregate over profiles
    #[must_use]
    pub fn from_profiles(profiles: &[MentalResilienceProfile]) -> Self {
        let reactions: Vec<&MistakeReactionPair> = profiles
            .iter()
            .flat_map(|profile| profile.reactions.iter())
            .collect();
        let mri_values: Vec<f64> = reactions
            .iter()
            .filter(|pair| pair.classification != ResilienceClassification::ChainError)
            .map(|pair| pair.mri)
            .collect();

        let (runners_by_classification, runners_without_reactions) = profiles.iter().fold(
            (BTreeMap::new(), 0),
            |(mut counts, without), profile| match profile.classification {
                Some(classification) => {
                    *counts.entry(classification).or_insert(0) += 1;
                    (counts, without)
                }
                None => (counts, without + 1),
            },
        );
        let reactions_by_classification =
            reactions.iter().fold(BTreeMap::new(), |mut counts, pair| {
                *counts.entry(pair.classification).or_insert(0) += 1;
                counts
            });

        Self {
            total_runners: profiles.len(),
            runners_by_classification,
            runners_without_reactions,
            reactions_by_classification,
            mean_mri: mean(&mri_values),
            median_mri: median(&mri_values),
        }
    }
}

/// Scored reactions and the unreacted last mistake of a runner
fn pair_reactions(
    performances: &[SegmentPerformance],
    mistakes: &[bool],
    normal_pi: f64,
    policy: &MentalResiliencePolicy,
) -> (Vec<MistakeReactionPair>, Option<MistakeSegment>) {
    let flagged: Vec<(usize, &SegmentPerformance)> = performances
        .iter()
        .enumerate()
        .filter(|(index, _)| mistakes.get(*index).copied().unwrap_or(false))
        .collect();

    let reactions: Vec<MistakeReactionPair> = flagged
        .iter()
        .filter_map(|(index, mistake)| {
            let reaction = performances.get(index + 1)?;
            if reaction.segment.from != mistake.segment.to || reaction.segment.is_finish_leg() {
                return None;
            }
            let mri = reaction.performance_index / normal_pi;
            let chain = mistakes.get(index + 1).copied().unwrap_or(false);
            Some(MistakeReactionPair {
                mistake: MistakeSegment::from(*mistake),
                reaction_leg_number: reaction.segment.leg_number,
                reaction_to: reaction.segment.to.clone(),
                reaction_pi: reaction.performance_index,
                mri,
                classification: if chain {
                    ResilienceClassification::ChainError
                } else {
                    ResilienceClassification::from_mri(mri, policy)
                },
            })
        })
        .collect();

    let unreacted = flagged.last().and_then(|(_, last)| {
        let reacted = reactions
            .last()
            .is_some_and(|pair| pair.mistake.leg_number == last.segment.leg_number);
        (!reacted).then(|| MistakeSegment::from(*last))
    });

    (reactions, unreacted)
}

/// Reaction-after-mistake analysis
#[derive(Debug, Clone, Copy)]
pub struct MentalResilienceAnalyzer<'a> {
    policy: &'a AnalysisPolicy,
}

impl<'a> MentalResilienceAnalyzer<'a> {
    /// Create an analyzer for the given policy
    #[must_use]
    pub const fn new(policy: &'a AnalysisPolicy) -> Self {
        Self { policy }
    }

    fn analyze_runner(
        &self,
        race: &RaceData,
        references: &ReferenceTimes,
        runner: &RunnerRace,
    ) -> Option<MentalResilienceProfile> {
        let qualified = qualify_runner(race, runner, references, self.policy, self.kind())?;
        let normal_pi = qualified.baseline.normal_pi;
        let mistakes = &qualified.baseline.scan.mistakes;
        let policy = &self.policy.mental_resilience;

        let (reactions, unreacted_mistake) =
            pair_reactions(&qualified.performances, mistakes, normal_pi, policy);
        let scored: Vec<f64> = reactions
            .iter()
            .filter(|pair| pair.classification != ResilienceClassification::ChainError)
            .map(|pair| pair.mri)
            .collect();
        let average_mri = mean(&scored);
        let classification = match average_mri {
            Some(average) => Some(ResilienceClassification::from_mri(average, policy)),
            None if !reactions.is_empty() => Some(ResilienceClassification::ChainError),
            None => None,
        };

        Some(MentalResilienceProfile {
            person_id: runner.person_id,
            class_name: runner.class_name.clone(),
            race_number: runner.race_number,
            class_context: qualified.context,
            normal_pi,
            mistake_count: mistakes.iter().filter(|mistake| **mistake).count(),
            reactions,
            average_mri,
            classification,
            unreacted_mistake,
        })
    }
}

impl RaceAnalyzer for MentalResilienceAnalyzer<'_> {
    type Profile = MentalResilienceProfile;
    type Statistics = MentalResilienceStatistics;

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::MentalResilience
    }

    fn analyze(
        &self,
        race: &RaceData,
        filter: &PersonFilter,
        cancel: &CancellationToken,
    ) -> AppResult<Analysis<MentalResilienceProfile, MentalResilienceStatistics>> {
        let references = ReferenceTimes::build(race, &self.policy.reference);
        let runners = race.selected_runners(filter);
        let profiles = map_runners(&runners, self.kind(), cancel, |runner| {
            Ok(self.analyze_runner(race, &references, runner))
        })?;
        let statistics = MentalResilienceStatistics::from_profiles(&profiles);

        Ok(Analysis {
            result_list_id: race.result_list_id,
            event_id: Some(race.event_id),
            runner_profiles: profiles,
            statistics: Some(statistics),
        })
    }
}
