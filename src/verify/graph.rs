use super::{seek_expected, Strictness, Verifier};
use crate::client::{GraphBucket, GraphData, GraphQuery, ObservedResponse};
use crate::condition::{ConditionLevel, ConditionRecord, CursorKey};
use crate::entity::Entity;
use crate::graph::GraphAggregate;
use crate::verdict::VerifyError;
use tracing::debug;

impl Verifier {
    /// Verify a graph response: a fixed number of contiguous buckets covering
    /// the requested day, each listing only conditions the harness saw
    /// accepted and, when it carries data, the aggregate of those conditions.
    pub fn verify_graph(
        &self,
        res: &ObservedResponse,
        entity_uuid: &str,
        query: &GraphQuery,
        buckets: &[GraphBucket],
        strictness: Strictness,
    ) -> Result<(), VerifyError> {
        let verify = &self.config().verify;
        if buckets.len() != verify.graph_buckets {
            return Err(VerifyError::invalid(
                res,
                format!(
                    "{} graph buckets returned, expected {}",
                    buckets.len(),
                    verify.graph_buckets
                ),
            ));
        }
        if let Some(first) = buckets.first() {
            if first.start_at != query.date {
                return Err(VerifyError::invalid(
                    res,
                    format!(
                        "graph starts at {}, requested date is {}",
                        first.start_at, query.date
                    ),
                ));
            }
        }

        let entity = self.entity_by_uuid(entity_uuid)?;

        // Newest bucket first, so each bucket must end where the newer one starts
        let mut newer: Option<&GraphBucket> = None;
        for bucket in buckets.iter().rev() {
            if let Some(newer) = newer {
                if bucket.end_at != newer.start_at {
                    return Err(VerifyError::invalid(
                        res,
                        format!(
                            "ordering: bucket ending at {} does not precede bucket starting at {}",
                            bucket.end_at, newer.start_at
                        ),
                    ));
                }
            }
            newer = Some(bucket);

            // Bounds come from the target, so the span is checked without overflow
            if bucket.start_at.checked_add(verify.bucket_seconds) != Some(bucket.end_at) {
                return Err(VerifyError::invalid(
                    res,
                    format!(
                        "bucket [{}, {}) does not span {} seconds",
                        bucket.start_at, bucket.end_at, verify.bucket_seconds
                    ),
                ));
            }

            if let Err(err) = self.verify_bucket(res, &entity, bucket, strictness) {
                debug!(
                    uuid = %entity_uuid,
                    start_at = bucket.start_at,
                    error = %err,
                    "Graph bucket verification failed"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Match one bucket's timestamps against the log and compare its aggregate.
    /// The read lock is held until the aggregate comparison is done.
    fn verify_bucket(
        &self,
        res: &ObservedResponse,
        entity: &Entity,
        bucket: &GraphBucket,
        strictness: Strictness,
    ) -> Result<(), VerifyError> {
        entity.with_conditions(|store| {
            let mut cursor = store.lower_bound(ConditionLevel::ALL, bucket.end_at);
            let mut matched: Vec<&ConditionRecord> =
                Vec::with_capacity(bucket.condition_timestamps.len());

            let mut newer: Option<CursorKey> = None;
            for &timestamp in bucket.condition_timestamps.iter().rev() {
                if !(bucket.start_at <= timestamp && timestamp < bucket.end_at) {
                    return Err(VerifyError::invalid(
                        res,
                        format!(
                            "condition timestamp {} outside bucket [{}, {})",
                            timestamp, bucket.start_at, bucket.end_at
                        ),
                    ));
                }

                let key = CursorKey::new(timestamp);
                if let Some(newer) = newer {
                    if !key.less(&newer) {
                        return Err(VerifyError::ordering(
                            res,
                            format!(
                                "condition timestamps {} and {} are not ascending",
                                timestamp, newer.timestamp_unix
                            ),
                        ));
                    }
                }
                newer = Some(key);

                matched.push(seek_expected(res, &mut cursor, timestamp, strictness, |_| true)?);
            }

            match &bucket.data {
                // Target had too little data to aggregate
                None => Ok(()),
                Some(data) => {
                    let expected =
                        GraphAggregate::build(matched.iter().copied(), &self.config().scoring);
                    compare_aggregate(res, bucket, data, &expected)
                }
            }
        })
    }
}

fn compare_aggregate(
    res: &ObservedResponse,
    bucket: &GraphBucket,
    actual: &GraphData,
    expected: &GraphAggregate,
) -> Result<(), VerifyError> {
    let detail = &actual.detail;
    let mut wrong = Vec::new();
    if actual.score != expected.score {
        wrong.push(format!("score {} (expected {})", actual.score, expected.score));
    }
    if actual.sitting != expected.sitting {
        wrong.push(format!("sitting {} (expected {})", actual.sitting, expected.sitting));
    }
    for (name, got, want) in [
        ("is_broken", detail.is_broken, expected.is_broken),
        ("is_dirty", detail.is_dirty, expected.is_dirty),
        ("is_overweight", detail.is_overweight, expected.is_overweight),
        ("missing_data", detail.missing_data, expected.missing_data),
    ] {
        if got != want {
            wrong.push(format!("{} {} (expected {})", name, got, want));
        }
    }

    if wrong.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::mismatch(
            res,
            format!("graph bucket starting at {}: {}", bucket.start_at, wrong.join(", ")),
        ))
    }
}
