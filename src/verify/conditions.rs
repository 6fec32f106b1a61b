use super::{seek_expected, Strictness, Verifier};
use crate::client::{ConditionEntry, ConditionQuery, ObservedResponse};
use crate::condition::{ConditionLevel, ConditionRecord, CursorKey};
use crate::entity::Entity;
use crate::verdict::VerifyError;
use std::fmt::Debug;
use tracing::debug;

impl Verifier {
    /// Verify a condition list response of one entity.
    ///
    /// Entries must be strictly newest first, stay within the limit and the
    /// query window, and each must match a record the harness saw accepted.
    /// In `Prepare` mode the response must also be complete.
    pub fn verify_conditions(
        &self,
        res: &ObservedResponse,
        entity_uuid: &str,
        query: &ConditionQuery,
        entries: &[ConditionEntry],
        strictness: Strictness,
    ) -> Result<(), VerifyError> {
        let limit = query
            .limit
            .unwrap_or(self.config().verify.condition_limit);
        if entries.len() > limit {
            return Err(VerifyError::invalid(
                res,
                format!("{} conditions returned, limit is {}", entries.len(), limit),
            ));
        }

        if let (Some(start_time), Some(oldest)) = (query.start_time, entries.last()) {
            if oldest.timestamp < start_time {
                return Err(VerifyError::invalid(
                    res,
                    format!(
                        "condition at {} is older than start_time {}",
                        oldest.timestamp, start_time
                    ),
                ));
            }
        }

        let filter = ConditionLevel::parse_filter(&query.condition_level);
        let entity = self.entity_by_uuid(entity_uuid)?;

        let result = entity.with_conditions(|store| {
            let mut cursor = store.lower_bound(filter, query.end_time);

            let mut newer: Option<CursorKey> = None;
            for entry in entries {
                let key = CursorKey::new(entry.timestamp);
                if let Some(newer) = newer {
                    if !key.less(&newer) {
                        return Err(VerifyError::ordering(
                            res,
                            format!(
                                "condition at {} follows condition at {}",
                                entry.timestamp, newer.timestamp_unix
                            ),
                        ));
                    }
                }
                newer = Some(key);

                let expected =
                    seek_expected(res, &mut cursor, entry.timestamp, strictness, |_| true)?;
                compare_entry(res, &entity, expected, entry)?;
            }

            // A short page is only complete if nothing else matches the query
            if strictness == Strictness::Prepare && entries.len() < limit {
                if let Some(next) = cursor.prev() {
                    let in_window = query
                        .start_time
                        .map_or(true, |start| start <= next.timestamp_unix());
                    if in_window {
                        return Err(VerifyError::invalid(
                            res,
                            format!(
                                "{} conditions returned but condition at {} also matches",
                                entries.len(),
                                next.timestamp_unix()
                            ),
                        ));
                    }
                }
            }
            Ok(())
        });

        if let Err(err) = &result {
            debug!(uuid = %entity_uuid, error = %err, "Condition list verification failed");
        }
        result
    }
}

/// Field-by-field comparison of a matched record and the response entry.
fn compare_entry(
    res: &ObservedResponse,
    entity: &Entity,
    expected: &ConditionRecord,
    actual: &ConditionEntry,
) -> Result<(), VerifyError> {
    let ts = actual.timestamp;

    let condition = expected.condition_string();
    if actual.condition != condition {
        return Err(field_mismatch(res, ts, "condition", &actual.condition, &condition));
    }
    if actual.condition_level != expected.level_label() {
        return Err(field_mismatch(
            res,
            ts,
            "condition_level",
            &actual.condition_level,
            expected.level_label(),
        ));
    }
    if actual.is_sitting != expected.is_sitting() {
        return Err(field_mismatch(
            res,
            ts,
            "is_sitting",
            actual.is_sitting,
            expected.is_sitting(),
        ));
    }
    if actual.entity_uuid != entity.uuid {
        return Err(field_mismatch(res, ts, "jia_isu_uuid", &actual.entity_uuid, &entity.uuid));
    }
    if actual.message != expected.message() {
        return Err(field_mismatch(res, ts, "message", &actual.message, expected.message()));
    }
    if actual.entity_name != entity.name {
        return Err(field_mismatch(res, ts, "isu_name", &actual.entity_name, &entity.name));
    }
    Ok(())
}

fn field_mismatch(
    res: &ObservedResponse,
    timestamp: i64,
    field: &str,
    actual: impl Debug,
    expected: impl Debug,
) -> VerifyError {
    VerifyError::mismatch(
        res,
        format!(
            "condition at {}: {} is {:?}, expected {:?}",
            timestamp, field, actual, expected
        ),
    )
}
