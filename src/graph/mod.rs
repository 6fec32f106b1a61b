//! Per-bucket graph aggregate.
//!
//! Reproduces the target's scoring formula from the records that fall into
//! one bucket. The result depends only on the multiset of records, never on
//! their order.

use crate::condition::ConditionRecord;
use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};

/// Aggregate of one graph bucket
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphAggregate {
    /// 100 minus the penalty of every flag seen at least once, floored at 0
    pub score: i64,
    /// Integer percentage of records with `is_sitting`
    pub sitting: i64,
    pub is_dirty: bool,
    pub is_overweight: bool,
    pub is_broken: bool,
    /// Fewer records than the expected sampling density
    pub missing_data: bool,
}

impl GraphAggregate {
    pub fn build<'a, I>(records: I, scoring: &ScoringConfig) -> Self
    where
        I: IntoIterator<Item = &'a ConditionRecord>,
    {
        let mut count = 0usize;
        let mut sitting_count = 0i64;
        let mut aggregate = Self::default();

        for record in records {
            count += 1;
            if record.is_sitting() {
                sitting_count += 1;
            }
            aggregate.is_dirty |= record.is_dirty();
            aggregate.is_overweight |= record.is_overweight();
            aggregate.is_broken |= record.is_broken();
        }

        let mut penalty = 0;
        if aggregate.is_dirty {
            penalty += scoring.dirty_penalty;
        }
        if aggregate.is_overweight {
            penalty += scoring.overweight_penalty;
        }
        if aggregate.is_broken {
            penalty += scoring.broken_penalty;
        }

        aggregate.score = (100 - penalty).max(0);
        aggregate.sitting = if count == 0 {
            0
        } else {
            sitting_count * 100 / count as i64
        };
        aggregate.missing_data = count < scoring.min_samples_per_bucket;
        aggregate
    }
}
