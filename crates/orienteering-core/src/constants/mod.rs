// ABOUTME: Default analysis policy values organized by analyzer
// ABOUTME: Single source for thresholds shared by the reference, baseline and classifier engines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! These are the defaults that seed `AnalysisPolicy`. Analyzers never read
//! them directly; they receive the policy value so a changed threshold cannot
//! drift between sibling analyzers.

/// Virtual control codes inserted by the segment builder
pub mod controls {
    /// Code of the virtual start control (t = 0)
    pub const START_CODE: &str = "S";
    /// Code of the virtual finish control (t = finish runtime)
    pub const FINISH_CODE: &str = "F";
}

/// Runner-count gates applied before any per-runner result is emitted
pub mod gates {
    /// Minimum runners in a class for any per-runner analysis
    pub const MIN_CLASS_RUNNERS: usize = 3;
    /// Class pools smaller than this fall back to the cross-class pool
    pub const CROSS_CLASS_FALLBACK_BELOW: usize = 5;
    /// Class size from which results are flagged as reliable
    pub const RELIABLE_RUNNERS_THRESHOLD: usize = 5;
}

/// Reference ("par") time estimation
pub mod reference {
    /// Number of fastest durations averaged into a reference time
    pub const TOP_N: usize = 3;
}

/// Winsplits baseline (Normal PI) estimation
pub mod baseline {
    /// Relative loss above the median (percentage points) that marks a mistake
    pub const MISTAKE_PERCENT_ABOVE_MEDIAN: f64 = 25.0;
    /// Absolute loss against the reference (seconds) that marks a mistake
    pub const MISTAKE_MIN_LOSS_SECONDS: f64 = 30.0;
    /// Clean (non-mistake) segments required for a baseline
    pub const MIN_CLEAN_SEGMENTS: usize = 3;
}

/// Anomaly classifier with robust reference selection
pub mod anomaly {
    /// Self-exclusion equality tolerance (seconds): 1 ms
    pub const SELF_EXCLUSION_TOLERANCE_SECONDS: f64 = 0.001;
    /// Fastest time must be this much faster than the pool median (fraction)
    pub const MAJORITY_FASTEST_GAP: f64 = 0.50;
    /// Second-fastest time must be this much faster than the pool median (fraction)
    pub const MAJORITY_SECOND_GAP: f64 = 0.40;
    /// Minimum pool size for the slow-majority check
    pub const MAJORITY_MIN_POOL: usize = 5;
    /// Pool size from which the coefficient-of-variation check applies
    pub const MAJORITY_CV_MIN_POOL: usize = 6;
    /// Coefficient of variation of the slower tail that marks a dispersed majority
    pub const MAJORITY_TAIL_CV: f64 = 0.15;
    /// Minimum pool size for shortcut-cluster detection (before rank adjustment)
    pub const CLUSTER_MIN_POOL: usize = 8;
    /// Runner ranks up to this value shift cluster positions by one
    pub const CLUSTER_RANK_ADJUST_MAX: usize = 3;
    /// Maximum relative spread inside the suspected top cluster
    pub const CLUSTER_MAX_SPREAD: f64 = 0.10;
    /// Minimum relative gap between the top cluster and the honest group
    pub const CLUSTER_MIN_GAP: f64 = 0.25;
    /// Gap that marks the last honest-group position as its own outlier
    pub const CLUSTER_TAIL_OUTLIER_GAP: f64 = 0.40;
    /// Moderate time threshold as a fraction of the reference time
    pub const MODERATE_TIME_FRACTION: f64 = 0.20;
    /// Lower clamp of the moderate time threshold (seconds)
    pub const MODERATE_TIME_MIN_SECONDS: f64 = 40.0;
    /// Upper clamp of the moderate time threshold (seconds)
    pub const MODERATE_TIME_MAX_SECONDS: f64 = 150.0;
    /// High time threshold as a multiple of the moderate threshold
    pub const HIGH_TIME_MULTIPLIER: f64 = 1.8;
    /// Reference times below this (seconds) tighten the ratio thresholds
    pub const SHORT_SEGMENT_SECONDS: f64 = 50.0;
    /// Ratio threshold multiplier for short segments
    pub const SHORT_SEGMENT_MULTIPLIER: f64 = 0.70;
    /// Lower bound of the consistency band around aiValue = 1
    pub const CONSISTENCY_LOWER: f64 = 0.85;
    /// Ratio threshold for high suspicion
    pub const HIGH_RATIO: f64 = 0.30;
    /// Ratio threshold for moderate suspicion
    pub const MODERATE_RATIO: f64 = 0.45;
}

/// Cheating classifier with flat thresholds
pub mod cheating {
    /// Self-exclusion equality tolerance (seconds): exact equality
    pub const SELF_EXCLUSION_TOLERANCE_SECONDS: f64 = 0.0;
    /// High suspicion: PI against the cleaned reference below this
    pub const HIGH_PI: f64 = 0.80;
    /// High suspicion: anomaly index below this
    pub const HIGH_AI: f64 = 0.75;
    /// Moderate suspicion: PI against the cleaned reference below this
    pub const MODERATE_PI: f64 = 0.90;
    /// Moderate suspicion: anomaly index below this
    pub const MODERATE_AI: f64 = 0.85;
}

/// Hanging (drafting) detection
pub mod hanging {
    /// Segment PI / Normal PI at or below this flags a hanging candidate
    pub const HANGING_INDEX_THRESHOLD: f64 = 0.85;
    /// Maximum gap (seconds) between driver and passenger punches
    pub const PROXIMITY_WINDOW_SECONDS: f64 = 30.0;
    /// Iteration cap of the baseline refinement loop
    pub const MAX_ITERATIONS: usize = 5;
    /// Normal PI change below which the refinement has converged
    pub const CONVERGENCE_EPSILON: f64 = 0.01;
    /// Hanging segment count that classifies a runner as high hanging
    pub const HIGH_SEGMENT_COUNT: usize = 3;
    /// Hanging segment percentage that classifies a runner as high hanging
    pub const HIGH_PERCENTAGE: f64 = 30.0;
}

/// Mental resilience reaction buckets
pub mod mental_resilience {
    /// MRI below this after a mistake is a panic reaction
    pub const PANIC_BELOW: f64 = 0.90;
    /// MRI above this after a mistake is a resigned reaction
    pub const RESIGNER_ABOVE: f64 = 1.10;
}
