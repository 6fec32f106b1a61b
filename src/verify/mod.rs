//! Response verifiers.
//!
//! Every verifier compares one captured response against the harness' own
//! model. Shape checks (status, content type, JSON) come first and
//! short-circuit; semantic checks then walk the entity's condition log under
//! its read lock.

mod conditions;
mod graph;
mod listing;
mod resources;
mod shape;
mod trend;

#[cfg(test)]
mod tests;

pub use shape::{
    verify_4xx_error, verify_bad_request_body, verify_content_type, verify_entity_not_found,
    verify_json_body, verify_json_response, verify_not_signed_in, verify_status_code,
    verify_status_codes, verify_text,
};

use crate::client::ObservedResponse;
use crate::condition::ConditionRecord;
use crate::config::LoadcheckConfig;
use crate::entity::{Entity, EntityRegistry};
use crate::store::ConditionCursor;
use crate::verdict::VerifyError;
use std::sync::Arc;
use tracing::warn;

/// How much lag behind the model a response may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Writes race the read: the target may not reflect every accepted
    /// write yet, so expected records missing from the response are tolerated.
    Load,
    /// Quiescent dataset: the response must reproduce the model step for step.
    Prepare,
}

impl Strictness {
    pub fn tolerates_gaps(self) -> bool {
        matches!(self, Self::Load)
    }
}

/// Shared context of every validator task: the entity registry and the
/// pinned contract constants.
#[derive(Debug, Clone)]
pub struct Verifier {
    registry: Arc<EntityRegistry>,
    config: Arc<LoadcheckConfig>,
}

impl Verifier {
    pub fn new(registry: Arc<EntityRegistry>, config: Arc<LoadcheckConfig>) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LoadcheckConfig {
        &self.config
    }

    fn entity_by_uuid(&self, uuid: &str) -> Result<Arc<Entity>, VerifyError> {
        self.registry.get_by_uuid(uuid).ok_or_else(|| {
            warn!(uuid = %uuid, "Verification requested for unregistered entity");
            VerifyError::Internal(format!("entity {} is not registered", uuid))
        })
    }
}

/// Advance `cursor` to the record the response claims at `timestamp`.
///
/// Records newer than `timestamp`, or at `timestamp` but rejected by
/// `accept`, are skipped; `strictness` decides whether skipping is allowed.
/// Reaching an older record or the end of the log means the response holds
/// data that was never written.
fn seek_expected<'a>(
    res: &ObservedResponse,
    cursor: &mut ConditionCursor<'a>,
    timestamp: i64,
    strictness: Strictness,
    accept: impl Fn(&ConditionRecord) -> bool,
) -> Result<&'a ConditionRecord, VerifyError> {
    let mut skipped = 0usize;
    loop {
        let expected = match cursor.prev() {
            Some(r) if r.timestamp_unix() >= timestamp => r,
            _ => return Err(VerifyError::fabricated(res, timestamp)),
        };
        if expected.timestamp_unix() == timestamp && accept(expected) {
            if skipped > 0 && !strictness.tolerates_gaps() {
                return Err(VerifyError::mismatch(
                    res,
                    format!(
                        "{} expected condition(s) newer than {} are missing",
                        skipped, timestamp
                    ),
                ));
            }
            return Ok(expected);
        }
        skipped += 1;
    }
}
