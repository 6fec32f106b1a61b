use super::Verifier;
use crate::client::{EntitySummary, ObservedResponse};
use crate::entity::Entity;
use crate::verdict::VerifyError;
use std::sync::Arc;

impl Verifier {
    /// Verify a user's entity list against registration order.
    ///
    /// `expected` is newest first. A count mismatch is a single verdict;
    /// otherwise every wrong position is reported.
    pub fn verify_entity_listing(
        &self,
        res: &ObservedResponse,
        expected: &[Arc<Entity>],
        actual: &[EntitySummary],
    ) -> Vec<VerifyError> {
        if expected.len() != actual.len() {
            return vec![VerifyError::mismatch(
                res,
                format!("{} entities listed, expected {}", actual.len(), expected.len()),
            )];
        }

        expected
            .iter()
            .zip(actual)
            .enumerate()
            .filter_map(|(i, (exp, got))| {
                if exp.uuid != got.uuid {
                    Some(VerifyError::mismatch(
                        res,
                        format!(
                            "entity #{} is {} (expected {})",
                            i + 1,
                            got.uuid,
                            exp.uuid
                        ),
                    ))
                } else if exp.id != got.id || exp.name != got.name || exp.category != got.category {
                    Some(VerifyError::mismatch(
                        res,
                        format!("entity #{} ({}) has wrong details", i + 1, got.uuid),
                    ))
                } else {
                    None
                }
            })
            .collect()
    }
}
