use super::{seek_expected, Strictness, Verifier};
use crate::client::{ObservedResponse, TrendEntry};
use crate::condition::ConditionLevel;
use crate::entity::{Category, CategorySet};
use crate::verdict::VerifyError;
use std::collections::HashSet;
use tracing::debug;

impl Verifier {
    /// Verify a cross-entity trend response.
    ///
    /// Every category must be a catalog category and the response must cover
    /// the whole catalog. Within a category, conditions are newest first, and
    /// each one is the accepted record of an existing entity of that category.
    /// An entity appears at most once in the whole response.
    ///
    /// Entity logs are locked one at a time.
    pub fn verify_trend(
        &self,
        res: &ObservedResponse,
        entries: &[TrendEntry],
    ) -> Result<(), VerifyError> {
        let mut categories = CategorySet::default();
        let mut seen: HashSet<i64> = HashSet::new();

        for entry in entries {
            let category = Category::parse(&entry.category)
                .map_err(|e| VerifyError::invalid(res, e.to_string()))?;
            categories.insert(category);

            let mut newer: Option<i64> = None;
            for condition in &entry.conditions {
                if let Some(newer) = newer {
                    if condition.timestamp > newer {
                        return Err(VerifyError::ordering(
                            res,
                            format!(
                                "{}: condition at {} follows condition at {}",
                                entry.category, condition.timestamp, newer
                            ),
                        ));
                    }
                }
                newer = Some(condition.timestamp);

                let entity = self.registry().get_by_id(condition.entity_id).ok_or_else(|| {
                    VerifyError::mismatch(
                        res,
                        format!("isu_id {} does not exist", condition.entity_id),
                    )
                })?;
                if entity.category != entry.category {
                    return Err(VerifyError::mismatch(
                        res,
                        format!(
                            "isu_id {} is listed under {} but belongs to {}",
                            entity.id, entry.category, entity.category
                        ),
                    ));
                }

                let level = ConditionLevel::from_label(&condition.condition_level)
                    .ok_or_else(|| {
                        VerifyError::invalid(
                            res,
                            format!("unknown condition_level '{}'", condition.condition_level),
                        )
                    })?;

                entity.with_conditions(|store| {
                    let mut cursor = store.end(ConditionLevel::ALL);
                    seek_expected(res, &mut cursor, condition.timestamp, Strictness::Load, |r| {
                        r.level() == level
                    })
                    .map(|_| ())
                })?;

                if !seen.insert(entity.id) {
                    return Err(VerifyError::mismatch(
                        res,
                        format!("isu_id {} appears more than once", entity.id),
                    ));
                }
            }
        }

        if !categories.is_full() {
            let missing = categories.missing();
            debug!(missing = missing.len(), "Trend response misses categories");
            return Err(VerifyError::invalid(
                res,
                format!("trend misses categories: {}", missing.join(", ")),
            ));
        }
        Ok(())
    }
}
