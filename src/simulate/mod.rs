//! Self-check driver.
//!
//! Runs writer tasks that append conditions while validator tasks verify
//! reference renderings of the same model. A correct verifier reports no
//! failures: load-mode checks tolerate the writes racing them, and the
//! prepare-mode pass after the writers finish must match exactly.

mod reference;

pub use reference::ReferenceTarget;

use crate::client::{
    ConditionEntry, ConditionQuery, GraphBucket, GraphQuery, ObservedResponse, TrendEntry,
};
use crate::condition::{ConditionFlags, ConditionRecord};
use crate::config::LoadcheckConfig;
use crate::entity::{Category, Entity, EntityRegistry, CATEGORIES};
use crate::verdict::VerifyError;
use crate::verify::{verify_json_response, Strictness, Verifier};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::{Method, StatusCode, Url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SELF_CHECK_BASE: &str = "http://loadcheck.local";

const LEVEL_FILTERS: [&str; 4] = ["i,w,c", "i", "w,c", "c"];

/// Outcome of a self-check run
#[derive(Debug, Default)]
pub struct SelfCheckReport {
    pub writes: usize,
    pub checks: usize,
    pub failures: Vec<VerifyError>,
}

impl SelfCheckReport {
    fn merge(&mut self, other: SelfCheckReport) {
        self.writes += other.writes;
        self.checks += other.checks;
        self.failures.extend(other.failures);
    }
}

/// Register the simulated entities. Categories are assigned round-robin.
pub fn populate_registry(config: &LoadcheckConfig) -> Arc<EntityRegistry> {
    let registry = Arc::new(EntityRegistry::new());
    for i in 0..config.simulation.entities {
        let id = i as i64 + 1;
        registry.register(Entity::new(
            id,
            Uuid::new_v4().to_string(),
            format!("isu-{}", id),
            Category::nth(i).name(),
            format!("user-{}", i % 5),
        ));
    }
    registry
}

/// Run concurrent writers and validators, then a quiescent prepare pass.
pub async fn run_self_check(config: Arc<LoadcheckConfig>) -> Result<SelfCheckReport> {
    let registry = populate_registry(&config);
    let verifier = Verifier::new(Arc::clone(&registry), Arc::clone(&config));
    let target = ReferenceTarget::new(Arc::clone(&registry), Arc::clone(&config));
    let writers_done = Arc::new(AtomicBool::new(false));

    info!(
        entities = registry.len(),
        conditions_per_entity = config.simulation.conditions_per_entity,
        validators = config.simulation.validators,
        start = %format_unix(config.simulation.start_unix),
        "Self-check starting"
    );

    let writers: Vec<_> = registry
        .entities()
        .into_iter()
        .map(|entity| {
            let config = Arc::clone(&config);
            tokio::spawn(async move { write_conditions(entity, &config).await })
        })
        .collect();

    let validators: Vec<_> = (0..config.simulation.validators)
        .map(|_| {
            let verifier = verifier.clone();
            let target = target.clone();
            let writers_done = Arc::clone(&writers_done);
            tokio::spawn(async move { validate_until(&verifier, &target, &writers_done).await })
        })
        .collect();

    let mut report = SelfCheckReport::default();
    for written in join_all(writers).await {
        report.writes += written.context("Writer task panicked")?;
    }
    writers_done.store(true, Ordering::SeqCst);
    for partial in join_all(validators).await {
        report.merge(partial.context("Validator task panicked")?);
    }
    info!(writes = report.writes, checks = report.checks, "Load phase finished");

    report.merge(prepare_pass(&verifier, &target));

    info!(
        checks = report.checks,
        failures = report.failures.len(),
        "Self-check finished"
    );
    Ok(report)
}

async fn write_conditions(entity: Arc<Entity>, config: &LoadcheckConfig) -> usize {
    let sim = &config.simulation;
    let mut rng = StdRng::from_entropy();
    for n in 0..sim.conditions_per_entity {
        let timestamp = sim.start_unix + n as i64 * sim.interval_seconds;
        let flags = ConditionFlags::new(rng.gen_bool(0.2), rng.gen_bool(0.2), rng.gen_bool(0.1));
        let is_sitting = rng.gen_bool(0.5);
        entity.record_condition(ConditionRecord::new(
            entity.id,
            timestamp,
            flags,
            is_sitting,
            format!("report {} of {}", n, entity.name),
        ));
        if n % 8 == 0 {
            tokio::task::yield_now().await;
        }
    }
    debug!(uuid = %entity.uuid, count = sim.conditions_per_entity, "Writer finished");
    sim.conditions_per_entity
}

async fn validate_until(
    verifier: &Verifier,
    target: &ReferenceTarget,
    writers_done: &AtomicBool,
) -> SelfCheckReport {
    let mut rng = StdRng::from_entropy();
    let mut report = SelfCheckReport::default();
    let entities = verifier.registry().entities();
    let sim = &verifier.config().simulation;

    while !writers_done.load(Ordering::SeqCst) {
        let Some(entity) = entities.choose(&mut rng) else {
            break;
        };
        let end_time = rng.gen_range(sim.start_unix..=sim.end_unix() + sim.interval_seconds);
        let filter = LEVEL_FILTERS.choose(&mut rng).copied().unwrap_or("i,w,c");
        let mut query = ConditionQuery::new(end_time, filter);
        if rng.gen_bool(0.5) {
            query = query.with_limit(rng.gen_range(1..=50));
        }
        if rng.gen_bool(0.3) {
            query = query.with_start_time(end_time - 30 * sim.interval_seconds);
        }

        report.checks += 1;
        if let Err(err) =
            check_conditions(verifier, target, &entity.uuid, &query, Strictness::Load)
        {
            warn!(error = %err, "Load-mode condition check failed");
            report.failures.push(err);
        }

        report.checks += 1;
        let graph = GraphQuery {
            date: sim.start_unix,
        };
        if let Err(err) = check_graph(verifier, target, &entity.uuid, &graph, Strictness::Load) {
            warn!(error = %err, "Load-mode graph check failed");
            report.failures.push(err);
        }

        tokio::task::yield_now().await;
    }
    report
}

/// Exact checks against the finished dataset
fn prepare_pass(verifier: &Verifier, target: &ReferenceTarget) -> SelfCheckReport {
    let mut report = SelfCheckReport::default();
    let sim = &verifier.config().simulation;
    let end_time = sim.end_unix() + 1;

    for entity in verifier.registry().entities() {
        for filter in LEVEL_FILTERS {
            let query = ConditionQuery::new(end_time, filter);
            report.checks += 1;
            if let Err(err) =
                check_conditions(verifier, target, &entity.uuid, &query, Strictness::Prepare)
            {
                report.failures.push(err);
            }
        }

        report.checks += 1;
        let graph = GraphQuery {
            date: sim.start_unix,
        };
        if let Err(err) = check_graph(verifier, target, &entity.uuid, &graph, Strictness::Prepare) {
            report.failures.push(err);
        }
    }

    if verifier.registry().len() >= CATEGORIES.len() && sim.conditions_per_entity > 0 {
        report.checks += 1;
        if let Err(err) = check_trend(verifier, target) {
            report.failures.push(err);
        }
    } else {
        info!("Too few entities to cover every category, skipping trend check");
    }

    for err in &report.failures {
        warn!(error = %err, "Prepare-mode check failed");
    }
    report
}

fn check_conditions(
    verifier: &Verifier,
    target: &ReferenceTarget,
    uuid: &str,
    query: &ConditionQuery,
    strictness: Strictness,
) -> Result<(), VerifyError> {
    let rendered = target
        .conditions(uuid, query)
        .ok_or_else(|| VerifyError::Internal(format!("entity {} is not registered", uuid)))?;
    let query_string = query
        .to_query_string()
        .map_err(|e| VerifyError::Internal(format!("cannot encode condition query: {}", e)))?;
    let path = format!("/api/condition/{}?{}", uuid, query_string);
    let res = observe(&path, &rendered)?;
    let entries: Vec<ConditionEntry> =
        verify_json_response(&res, StatusCode::OK, &verifier.config().verify.json_content_type)?;
    verifier.verify_conditions(&res, uuid, query, &entries, strictness)
}

fn check_graph(
    verifier: &Verifier,
    target: &ReferenceTarget,
    uuid: &str,
    query: &GraphQuery,
    strictness: Strictness,
) -> Result<(), VerifyError> {
    let rendered = target
        .graph(uuid, query)
        .ok_or_else(|| VerifyError::Internal(format!("entity {} is not registered", uuid)))?;
    let res = observe(&format!("/api/isu/{}/graph?date={}", uuid, query.date), &rendered)?;
    let buckets: Vec<GraphBucket> =
        verify_json_response(&res, StatusCode::OK, &verifier.config().verify.json_content_type)?;
    verifier.verify_graph(&res, uuid, query, &buckets, strictness)
}

fn check_trend(verifier: &Verifier, target: &ReferenceTarget) -> Result<(), VerifyError> {
    let res = observe("/api/trend", &target.trend())?;
    let entries: Vec<TrendEntry> =
        verify_json_response(&res, StatusCode::OK, &verifier.config().verify.json_content_type)?;
    verifier.verify_trend(&res, &entries)
}

/// Wrap a rendered payload as if the target had returned it
fn observe<T: serde::Serialize>(
    path: &str,
    payload: &T,
) -> Result<ObservedResponse, VerifyError> {
    let url = Url::parse(SELF_CHECK_BASE)
        .and_then(|base| base.join(path))
        .map_err(|e| VerifyError::Internal(format!("cannot build URL for {}: {}", path, e)))?;
    ObservedResponse::new(Method::GET, url, StatusCode::OK)
        .with_json(payload)
        .map_err(|e| VerifyError::Internal(format!("cannot encode payload for {}: {}", path, e)))
}

fn format_unix(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
