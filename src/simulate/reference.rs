use crate::client::{
    ConditionEntry, ConditionQuery, EntitySummary, GraphBucket, GraphData, GraphDetail,
    GraphQuery, TrendCondition, TrendEntry,
};
use crate::condition::{ConditionLevel, ConditionRecord};
use crate::config::LoadcheckConfig;
use crate::entity::{Entity, EntityRegistry, CATEGORIES};
use crate::graph::GraphAggregate;
use std::sync::Arc;

/// Renders the responses a correct target would return for the current model.
#[derive(Debug, Clone)]
pub struct ReferenceTarget {
    registry: Arc<EntityRegistry>,
    config: Arc<LoadcheckConfig>,
}

impl ReferenceTarget {
    pub fn new(registry: Arc<EntityRegistry>, config: Arc<LoadcheckConfig>) -> Self {
        Self { registry, config }
    }

    /// Condition list page, newest first. `None` for an unknown entity.
    pub fn conditions(&self, uuid: &str, query: &ConditionQuery) -> Option<Vec<ConditionEntry>> {
        let entity = self.registry.get_by_uuid(uuid)?;
        let filter = ConditionLevel::parse_filter(&query.condition_level);
        let limit = query.limit.unwrap_or(self.config.verify.condition_limit);
        let start_time = query.start_time.unwrap_or(i64::MIN);

        let entries = entity.with_conditions(|store| {
            store
                .lower_bound(filter, query.end_time)
                .take_while(|r| r.timestamp_unix() >= start_time)
                .take(limit)
                .map(|r| condition_entry(&entity, r))
                .collect()
        });
        Some(entries)
    }

    /// Graph buckets of the day starting at `query.date`, oldest first.
    /// Buckets without records carry no data.
    pub fn graph(&self, uuid: &str, query: &GraphQuery) -> Option<Vec<GraphBucket>> {
        let entity = self.registry.get_by_uuid(uuid)?;
        let verify = &self.config.verify;

        let buckets = entity.with_conditions(|store| {
            (0..verify.graph_buckets as i64)
                .map(|h| {
                    let start_at = query.date + h * verify.bucket_seconds;
                    let end_at = start_at + verify.bucket_seconds;
                    let mut records: Vec<&ConditionRecord> = store
                        .lower_bound(ConditionLevel::ALL, end_at)
                        .take_while(|r| r.timestamp_unix() >= start_at)
                        .collect();
                    records.reverse();

                    let data = if records.is_empty() {
                        None
                    } else {
                        let agg =
                            GraphAggregate::build(records.iter().copied(), &self.config.scoring);
                        Some(GraphData {
                            score: agg.score,
                            sitting: agg.sitting,
                            detail: GraphDetail {
                                is_dirty: agg.is_dirty,
                                is_overweight: agg.is_overweight,
                                is_broken: agg.is_broken,
                                missing_data: agg.missing_data,
                            },
                        })
                    };

                    GraphBucket {
                        start_at,
                        end_at,
                        data,
                        condition_timestamps: records.iter().map(|r| r.timestamp_unix()).collect(),
                    }
                })
                .collect()
        });
        Some(buckets)
    }

    /// Latest condition of every entity, grouped by category.
    ///
    /// Every catalog category is listed, possibly with no conditions.
    pub fn trend(&self) -> Vec<TrendEntry> {
        let entities = self.registry.entities();
        CATEGORIES
            .iter()
            .map(|category| {
                let mut conditions: Vec<TrendCondition> = entities
                    .iter()
                    .filter(|e| e.category == *category)
                    .filter_map(|e| {
                        e.with_conditions(|store| {
                            store.latest().map(|r| TrendCondition {
                                entity_id: e.id,
                                timestamp: r.timestamp_unix(),
                                condition_level: r.level_label().to_string(),
                            })
                        })
                    })
                    .collect();
                conditions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                TrendEntry {
                    category: category.to_string(),
                    conditions,
                }
            })
            .collect()
    }

    /// Entities of `owner`, newest registration first.
    pub fn entity_listing(&self, owner: &str) -> Vec<EntitySummary> {
        self.registry
            .owned_by(owner)
            .iter()
            .map(|e| EntitySummary {
                id: e.id,
                uuid: e.uuid.clone(),
                name: e.name.clone(),
                category: e.category.clone(),
            })
            .collect()
    }
}

fn condition_entry(entity: &Entity, record: &ConditionRecord) -> ConditionEntry {
    ConditionEntry {
        entity_uuid: entity.uuid.clone(),
        entity_name: entity.name.clone(),
        timestamp: record.timestamp_unix(),
        is_sitting: record.is_sitting(),
        condition: record.condition_string(),
        condition_level: record.level_label().to_string(),
        message: record.message().to_string(),
    }
}
