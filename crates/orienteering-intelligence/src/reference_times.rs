// ABOUTME: Reference ("par") time estimation over class and cross-class segment pools
// ABOUTME: Also provides runner self-exclusion with the runner's rank in the original pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Reference-Time Estimator
//!
//! Every runner's segment durations are pooled twice: under the class key and
//! under the cross-class key (`class_name = None`). Pools are sorted ascending
//! once and frozen; the reference for a key is the mean of its `top_n` fastest
//! durations.

use crate::config::{ReferencePolicy, SelfExclusionPolicy};
use crate::race::RaceData;
use crate::segments::SegmentKey;
use crate::statistics::mean;
use std::collections::HashMap;

/// Frozen duration pools and their reference times
#[derive(Debug, Clone, Default)]
pub struct ReferenceTimes {
    pools: HashMap<SegmentKey, Vec<f64>>,
    references: HashMap<SegmentKey, f64>,
}

impl ReferenceTimes {
    /// Pool every runner's segments and derive a reference for each key
    #[must_use]
    pub fn build(race: &RaceData, policy: &ReferencePolicy) -> Self {
        let mut pools = race
            .runners()
            .iter()
            .flat_map(|runner| {
                runner.segments.iter().flat_map(move |segment| {
                    [
                        (segment.class_key(&runner.class_name), segment.duration_seconds),
                        (segment.cross_class_key(), segment.duration_seconds),
                    ]
                })
            })
            .fold(
                HashMap::<SegmentKey, Vec<f64>>::new(),
                |mut pools, (key, duration)| {
                    pools.entry(key).or_default().push(duration);
                    pools
                },
            );
        for pool in pools.values_mut() {
            pool.sort_by(f64::total_cmp);
        }

        let references = pools
            .iter()
            .filter_map(|(key, pool)| {
                top_n_mean(pool, policy.top_n).map(|reference| (key.clone(), reference))
            })
            .collect();

        Self { pools, references }
    }

    /// Ascending pool for a key (empty when no runner ran the segment)
    #[must_use]
    pub fn pool(&self, key: &SegmentKey) -> &[f64] {
        self.pools.get(key).map_or(&[], Vec::as_slice)
    }

    /// Reference time for a key, `None` when the pool is empty
    #[must_use]
    pub fn reference(&self, key: &SegmentKey) -> Option<f64> {
        self.references.get(key).copied()
    }

    /// Class reference, falling back to the cross-class reference
    #[must_use]
    pub fn reference_with_fallback(&self, class_key: &SegmentKey) -> Option<f64> {
        self.reference(class_key).or_else(|| {
            self.reference(&SegmentKey::cross_class(&class_key.from, &class_key.to))
        })
    }
}

/// Mean of the `top_n` smallest values of an ascending pool (all values if fewer)
#[must_use]
pub fn top_n_mean(sorted_pool: &[f64], top_n: usize) -> Option<f64> {
    mean(&sorted_pool[..sorted_pool.len().min(top_n)])
}

/// A pool with one runner's own duration removed
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedPool {
    /// Remaining durations, ascending
    pub times: Vec<f64>,
    /// Count of original pool entries `<=` the runner's duration (1-based insert position)
    pub runner_rank: usize,
    /// Whether a matching entry was found and removed
    pub removed: bool,
}

/// Remove a runner's own duration from an ascending pool
///
/// Only the first entry within `tolerance_seconds` is removed; other runners
/// with an identical time stay in the pool. The rank is computed on the
/// original pool so later positional logic does not have to reconstruct it.
#[must_use]
pub fn exclude_runner(
    sorted_pool: &[f64],
    duration_seconds: f64,
    policy: SelfExclusionPolicy,
) -> ExcludedPool {
    let runner_rank = sorted_pool.partition_point(|t| *t <= duration_seconds);
    let position = sorted_pool
        .iter()
        .position(|t| (t - duration_seconds).abs() <= policy.tolerance_seconds);

    let mut times = sorted_pool.to_vec();
    if let Some(index) = position {
        times.remove(index);
    }

    ExcludedPool {
        times,
        runner_rank,
        removed: position.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MILLISECOND: SelfExclusionPolicy = SelfExclusionPolicy {
        tolerance_seconds: 0.001,
    };
    const EXACT: SelfExclusionPolicy = SelfExclusionPolicy {
        tolerance_seconds: 0.0,
    };

    #[test]
    fn test_self_exclusion_removes_runner_duration() {
        let pool = [100.0, 101.0, 102.0, 103.0, 104.0];
        let excluded = exclude_runner(&pool, 102.0, MILLISECOND);

        assert!(excluded.removed);
        assert_eq!(excluded.times, vec![100.0, 101.0, 103.0, 104.0]);
        assert_eq!(excluded.runner_rank, 3);
    }

    #[test]
    fn test_tolerance_decides_near_equal_durations() {
        let pool = [100.0, 102.000_4, 104.0];

        assert!(exclude_runner(&pool, 102.0, MILLISECOND).removed);
        let exact = exclude_runner(&pool, 102.0, EXACT);
        assert!(!exact.removed);
        assert_eq!(exact.times.len(), 3);
    }

    #[test]
    fn test_only_one_tied_duration_is_removed() {
        let pool = [90.0, 90.0, 95.0];
        let excluded = exclude_runner(&pool, 90.0, EXACT);
        assert_eq!(excluded.times, vec![90.0, 95.0]);
        assert_eq!(excluded.runner_rank, 2);
    }

    #[test]
    fn test_top_n_mean_uses_all_values_of_small_pools() {
        assert!(top_n_mean(&[100.0, 110.0, 120.0, 500.0], 3)
            .is_some_and(|r| (r - 110.0).abs() < 1e-9));
        assert!(top_n_mean(&[100.0, 120.0], 3).is_some_and(|r| (r - 110.0).abs() < 1e-9));
        assert!(top_n_mean(&[], 3).is_none());
    }
}
