// ABOUTME: Analysis policy configuration shared by every split-time analyzer
// ABOUTME: One immutable value object with env overrides, validation and a global default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Analysis Policy Configuration
//!
//! Every threshold used by the reference-time estimator, the baseline engine
//! and the four analyzers lives in [`AnalysisPolicy`]. Analyzers borrow the
//! policy they were constructed with, so sibling analyzers cannot drift apart
//! on shared values such as the top-N reference size or the runner gates.

pub mod error;

pub use error::ConfigError;

use orienteering_core::constants::{
    anomaly, baseline, cheating, gates, hanging, mental_resilience, reference,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Global policy singleton
static ANALYSIS_POLICY: OnceLock<AnalysisPolicy> = OnceLock::new();

/// Complete analysis policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPolicy {
    /// Runner-count gates
    pub gates: GatePolicy,
    /// Reference ("par") time estimation
    pub reference: ReferencePolicy,
    /// Winsplits baseline estimation
    pub baseline: BaselinePolicy,
    /// Anomaly classifier
    pub anomaly: AnomalyPolicy,
    /// Cheating classifier
    pub cheating: CheatingPolicy,
    /// Hanging detector
    pub hanging: HangingPolicy,
    /// Mental resilience analyzer
    pub mental_resilience: MentalResiliencePolicy,
}

/// Runner-count gates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Minimum runners in a class for any per-runner result
    pub min_class_runners: usize,
    /// Class pools (after self-exclusion) smaller than this use the cross-class pool
    pub cross_class_fallback_below: usize,
    /// Class size from which a profile is marked reliable
    pub reliable_runners_threshold: usize,
}

/// Reference time estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePolicy {
    /// Number of fastest durations averaged into the reference
    pub top_n: usize,
}

/// Winsplits baseline estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePolicy {
    /// Percentage points above the median diff that mark a mistake
    pub mistake_percent_above_median: f64,
    /// Seconds lost against the reference that mark a mistake
    pub mistake_min_loss_seconds: f64,
    /// Clean segments required for a baseline
    pub min_clean_segments: usize,
}

/// How a runner's own duration is removed from a reference pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfExclusionPolicy {
    /// Maximum absolute difference (seconds) treated as "the runner's own time"; 0 means exact
    pub tolerance_seconds: f64,
}

/// Anomaly classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPolicy {
    /// Self-exclusion rule
    pub self_exclusion: SelfExclusionPolicy,
    /// Slow-majority detection
    pub majority: MajorityMistakePolicy,
    /// Shortcut-cluster detection
    pub cluster: ShortcutClusterPolicy,
    /// Segment-length-aware thresholds
    pub thresholds: AnomalyThresholds,
}

/// Detection of a pool where the slow majority made a mistake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityMistakePolicy {
    /// Minimum pool size for the check
    pub min_pool: usize,
    /// Fastest must be faster than the median by more than this fraction
    pub fastest_gap: f64,
    /// Second-fastest must be faster than the median by more than this fraction
    pub second_gap: f64,
    /// Pool size from which the tail dispersion check applies
    pub cv_min_pool: usize,
    /// Coefficient of variation of positions 2.. that marks a dispersed majority
    pub tail_cv: f64,
}

/// Detection of a shortcut cluster in the top group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutClusterPolicy {
    /// Minimum pool size before rank adjustment
    pub min_pool: usize,
    /// Runner ranks up to this value shift inspected positions by one
    pub rank_adjust_max: usize,
    /// Maximum relative spread inside the top cluster
    pub max_spread: f64,
    /// Minimum relative gap to the honest group
    pub min_gap: f64,
    /// Gap at which the last honest position is its own outlier
    pub tail_outlier_gap: f64,
}

/// Anomaly classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Moderate time threshold as a fraction of the reference time
    pub moderate_time_fraction: f64,
    /// Lower clamp of the moderate time threshold (seconds)
    pub moderate_time_min_seconds: f64,
    /// Upper clamp of the moderate time threshold (seconds)
    pub moderate_time_max_seconds: f64,
    /// High time threshold as a multiple of the moderate one
    pub high_time_multiplier: f64,
    /// Reference times below this are short segments
    pub short_segment_seconds: f64,
    /// Ratio multiplier applied on short segments
    pub short_segment_multiplier: f64,
    /// Lower bound of the consistency band (upper bound is its reciprocal)
    pub consistency_lower: f64,
    /// Ratio threshold for high suspicion
    pub high_ratio: f64,
    /// Ratio threshold for moderate suspicion
    pub moderate_ratio: f64,
}

/// Cheating classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheatingPolicy {
    /// Self-exclusion rule
    pub self_exclusion: SelfExclusionPolicy,
    /// High suspicion PI threshold
    pub high_pi: f64,
    /// High suspicion AI threshold
    pub high_ai: f64,
    /// Moderate suspicion PI threshold
    pub moderate_pi: f64,
    /// Moderate suspicion AI threshold
    pub moderate_ai: f64,
}

/// Hanging detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangingPolicy {
    /// Hanging index (segment PI / Normal PI) at or below which a segment is flagged
    pub hanging_index_threshold: f64,
    /// Maximum seconds a driver may punch before the passenger
    pub proximity_window_seconds: f64,
    /// Iteration cap of the baseline refinement
    pub max_iterations: usize,
    /// Convergence epsilon on Normal PI
    pub convergence_epsilon: f64,
    /// Hanging segments that make a runner high hanging
    pub high_segment_count: usize,
    /// Hanging percentage that makes a runner high hanging
    pub high_percentage: f64,
}

/// Mental resilience buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalResiliencePolicy {
    /// MRI below this is a panic reaction
    pub panic_below: f64,
    /// MRI above this is a resigned reaction
    pub resigner_above: f64,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            gates: GatePolicy {
                min_class_runners: gates::MIN_CLASS_RUNNERS,
                cross_class_fallback_below: gates::CROSS_CLASS_FALLBACK_BELOW,
                reliable_runners_threshold: gates::RELIABLE_RUNNERS_THRESHOLD,
            },
            reference: ReferencePolicy {
                top_n: reference::TOP_N,
            },
            baseline: BaselinePolicy {
                mistake_percent_above_median: baseline::MISTAKE_PERCENT_ABOVE_MEDIAN,
                mistake_min_loss_seconds: baseline::MISTAKE_MIN_LOSS_SECONDS,
                min_clean_segments: baseline::MIN_CLEAN_SEGMENTS,
            },
            anomaly: AnomalyPolicy {
                self_exclusion: SelfExclusionPolicy {
                    tolerance_seconds: anomaly::SELF_EXCLUSION_TOLERANCE_SECONDS,
                },
                majority: MajorityMistakePolicy {
                    min_pool: anomaly::MAJORITY_MIN_POOL,
                    fastest_gap: anomaly::MAJORITY_FASTEST_GAP,
                    second_gap: anomaly::MAJORITY_SECOND_GAP,
                    cv_min_pool: anomaly::MAJORITY_CV_MIN_POOL,
                    tail_cv: anomaly::MAJORITY_TAIL_CV,
                },
                cluster: ShortcutClusterPolicy {
                    min_pool: anomaly::CLUSTER_MIN_POOL,
                    rank_adjust_max: anomaly::CLUSTER_RANK_ADJUST_MAX,
                    max_spread: anomaly::CLUSTER_MAX_SPREAD,
                    min_gap: anomaly::CLUSTER_MIN_GAP,
                    tail_outlier_gap: anomaly::CLUSTER_TAIL_OUTLIER_GAP,
                },
                thresholds: AnomalyThresholds {
                    moderate_time_fraction: anomaly::MODERATE_TIME_FRACTION,
                    moderate_time_min_seconds: anomaly::MODERATE_TIME_MIN_SECONDS,
                    moderate_time_max_seconds: anomaly::MODERATE_TIME_MAX_SECONDS,
                    high_time_multiplier: anomaly::HIGH_TIME_MULTIPLIER,
                    short_segment_seconds: anomaly::SHORT_SEGMENT_SECONDS,
                    short_segment_multiplier: anomaly::SHORT_SEGMENT_MULTIPLIER,
                    consistency_lower: anomaly::CONSISTENCY_LOWER,
                    high_ratio: anomaly::HIGH_RATIO,
                    moderate_ratio: anomaly::MODERATE_RATIO,
                },
            },
            cheating: CheatingPolicy {
                self_exclusion: SelfExclusionPolicy {
                    tolerance_seconds: cheating::SELF_EXCLUSION_TOLERANCE_SECONDS,
                },
                high_pi: cheating::HIGH_PI,
                high_ai: cheating::HIGH_AI,
                moderate_pi: cheating::MODERATE_PI,
                moderate_ai: cheating::MODERATE_AI,
            },
            hanging: HangingPolicy {
                hanging_index_threshold: hanging::HANGING_INDEX_THRESHOLD,
                proximity_window_seconds: hanging::PROXIMITY_WINDOW_SECONDS,
                max_iterations: hanging::MAX_ITERATIONS,
                convergence_epsilon: hanging::CONVERGENCE_EPSILON,
                high_segment_count: hanging::HIGH_SEGMENT_COUNT,
                high_percentage: hanging::HIGH_PERCENTAGE,
            },
            mental_resilience: MentalResiliencePolicy {
                panic_below: mental_resilience::PANIC_BELOW,
                resigner_above: mental_resilience::RESIGNER_ABOVE,
            },
        }
    }
}

impl AnalysisPolicy {
    /// Get the global policy instance
    pub fn global() -> &'static Self {
        ANALYSIS_POLICY.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                warn!("Failed to load analysis policy: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Load the policy from defaults plus `ORIENTEERING_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed or validation fails
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        match env::var(env_var_name) {
            Ok(val) => {
                *target = val
                    .parse()
                    .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
                Ok(())
            }
            Err(env::VarError::NotPresent) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Gates
        Self::apply_env_var(
            "ORIENTEERING_MIN_CLASS_RUNNERS",
            &mut self.gates.min_class_runners,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_CROSS_CLASS_FALLBACK_BELOW",
            &mut self.gates.cross_class_fallback_below,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_RELIABLE_RUNNERS_THRESHOLD",
            &mut self.gates.reliable_runners_threshold,
        )?;

        // Reference and baseline
        Self::apply_env_var("ORIENTEERING_REFERENCE_TOP_N", &mut self.reference.top_n)?;
        Self::apply_env_var(
            "ORIENTEERING_MISTAKE_PERCENT_ABOVE_MEDIAN",
            &mut self.baseline.mistake_percent_above_median,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_MISTAKE_MIN_LOSS_SECONDS",
            &mut self.baseline.mistake_min_loss_seconds,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_MIN_CLEAN_SEGMENTS",
            &mut self.baseline.min_clean_segments,
        )?;

        // Self-exclusion tolerances
        Self::apply_env_var(
            "ORIENTEERING_ANOMALY_SELF_EXCLUSION_TOLERANCE",
            &mut self.anomaly.self_exclusion.tolerance_seconds,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_CHEATING_SELF_EXCLUSION_TOLERANCE",
            &mut self.cheating.self_exclusion.tolerance_seconds,
        )?;

        // Hanging
        Self::apply_env_var(
            "ORIENTEERING_HANGING_INDEX_THRESHOLD",
            &mut self.hanging.hanging_index_threshold,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_HANGING_WINDOW_SECONDS",
            &mut self.hanging.proximity_window_seconds,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_HANGING_MAX_ITERATIONS",
            &mut self.hanging.max_iterations,
        )?;

        // Mental resilience
        Self::apply_env_var(
            "ORIENTEERING_MRI_PANIC_BELOW",
            &mut self.mental_resilience.panic_below,
        )?;
        Self::apply_env_var(
            "ORIENTEERING_MRI_RESIGNER_ABOVE",
            &mut self.mental_resilience.resigner_above,
        )?;

        Ok(self)
    }

    /// Validate the policy
    ///
    /// # Errors
    ///
    /// Returns an error if any threshold is non-positive or thresholds are misordered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gates.min_class_runners == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_class_runners must be at least 1",
            ));
        }
        if self.reference.top_n == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "reference top_n must be at least 1",
            ));
        }
        if self.baseline.min_clean_segments == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "min_clean_segments must be at least 1",
            ));
        }
        if self.anomaly.self_exclusion.tolerance_seconds < 0.0
            || self.cheating.self_exclusion.tolerance_seconds < 0.0
        {
            return Err(ConfigError::ValueOutOfRange(
                "self-exclusion tolerance must not be negative",
            ));
        }

        let thresholds = &self.anomaly.thresholds;
        if thresholds.moderate_time_min_seconds > thresholds.moderate_time_max_seconds {
            return Err(ConfigError::InvalidRange(
                "moderate_time_min_seconds must be <= moderate_time_max_seconds",
            ));
        }
        if thresholds.high_ratio >= thresholds.moderate_ratio {
            return Err(ConfigError::InvalidRange(
                "anomaly high_ratio must be < moderate_ratio",
            ));
        }
        if thresholds.consistency_lower <= 0.0 || thresholds.consistency_lower >= 1.0 {
            return Err(ConfigError::ValueOutOfRange(
                "consistency_lower must be in (0, 1)",
            ));
        }
        if self.cheating.high_pi > self.cheating.moderate_pi
            || self.cheating.high_ai > self.cheating.moderate_ai
        {
            return Err(ConfigError::InvalidRange(
                "cheating high thresholds must be <= moderate thresholds",
            ));
        }

        if self.hanging.max_iterations == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "hanging max_iterations must be at least 1",
            ));
        }
        if self.hanging.proximity_window_seconds < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "hanging proximity window must not be negative",
            ));
        }
        if self.hanging.hanging_index_threshold <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "hanging_index_threshold must be positive",
            ));
        }

        if self.mental_resilience.panic_below > self.mental_resilience.resigner_above {
            return Err(ConfigError::InvalidRange(
                "MRI panic_below must be <= resigner_above",
            ));
        }

        Ok(())
    }
}
