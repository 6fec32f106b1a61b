use super::*;
use crate::client::{
    ConditionEntry, ConditionQuery, FetchError, FetchErrorKind, GraphBucket, GraphQuery,
    Resources, TrendCondition, TrendEntry,
};
use crate::condition::{ConditionFlags, ConditionRecord};
use crate::entity::CATEGORIES;
use crate::simulate::ReferenceTarget;
use crate::verdict::VerdictKind;
use md5::{Digest, Md5};
use reqwest::{Method, StatusCode, Url};

const UUID: &str = "0694e4d7-dfce-4aec-b7ca-887ac42cfb8f";
const DAY: i64 = 1_627_776_000;
const BASE: &str = "http://target.test";

struct Fixture {
    registry: Arc<EntityRegistry>,
    verifier: Verifier,
    target: ReferenceTarget,
}

fn fixture_with(config: LoadcheckConfig) -> Fixture {
    let registry = Arc::new(EntityRegistry::new());
    let config = Arc::new(config);
    Fixture {
        verifier: Verifier::new(Arc::clone(&registry), Arc::clone(&config)),
        target: ReferenceTarget::new(Arc::clone(&registry), config),
        registry,
    }
}

fn fixture() -> Fixture {
    fixture_with(LoadcheckConfig::default())
}

impl Fixture {
    fn add_entity(&self, id: i64, uuid: &str, category: &str) -> Arc<Entity> {
        self.registry
            .register(Entity::new(id, uuid, format!("isu-{}", id), category, "alice"))
    }

    /// One entity with info records at 100, 200 and 300
    fn with_three_records() -> Self {
        let fx = fixture();
        let entity = fx.add_entity(1, UUID, CATEGORIES[0]);
        entity.record_conditions([100, 200, 300].map(|ts| info(1, ts)));
        fx
    }

    /// Entries the target would return for `timestamps`, in the given order.
    /// Timestamps absent from the log get a made-up entry.
    fn entries_at(&self, timestamps: &[i64]) -> Vec<ConditionEntry> {
        let all = self
            .target
            .conditions(UUID, &ConditionQuery::new(i64::MAX, "i,w,c").with_limit(1000))
            .unwrap();
        timestamps
            .iter()
            .map(|&ts| {
                all.iter().find(|e| e.timestamp == ts).cloned().unwrap_or_else(|| {
                    let mut made_up = all[0].clone();
                    made_up.timestamp = ts;
                    made_up
                })
            })
            .collect()
    }

    fn check_conditions(
        &self,
        query: &ConditionQuery,
        entries: &[ConditionEntry],
        strictness: Strictness,
    ) -> Result<(), VerifyError> {
        let res = response("/api/condition/0694e4d7-dfce-4aec-b7ca-887ac42cfb8f");
        self.verifier
            .verify_conditions(&res, UUID, query, entries, strictness)
    }
}

fn info(entity_id: i64, ts: i64) -> ConditionRecord {
    ConditionRecord::new(
        entity_id,
        ts,
        ConditionFlags::default(),
        false,
        format!("ok at {}", ts),
    )
}

fn record(entity_id: i64, ts: i64, flags: ConditionFlags, is_sitting: bool) -> ConditionRecord {
    ConditionRecord::new(entity_id, ts, flags, is_sitting, "reported")
}

fn response(path: &str) -> ObservedResponse {
    let url = Url::parse(BASE).unwrap().join(path).unwrap();
    ObservedResponse::new(Method::GET, url, StatusCode::OK)
}

fn kind(result: Result<(), VerifyError>) -> VerdictKind {
    result.unwrap_err().kind()
}

// Condition lists

#[test]
fn test_descending_complete_list_passes() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_limit(10);
    let entries = fx.entries_at(&[300, 200, 100]);

    assert!(fx.check_conditions(&query, &entries, Strictness::Load).is_ok());
    assert!(fx.check_conditions(&query, &entries, Strictness::Prepare).is_ok());
}

#[test]
fn test_out_of_order_list_is_ordering_error() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_limit(10);
    let entries = fx.entries_at(&[300, 100, 200]);

    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::Ordering
    );
}

#[test]
fn test_duplicate_timestamp_is_ordering_error() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c");
    let entries = fx.entries_at(&[300, 300]);

    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::Ordering
    );
}

#[test]
fn test_unknown_trailing_timestamp_is_fabrication() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_limit(10);
    let entries = fx.entries_at(&[300, 200, 100, 50]);

    let err = fx
        .check_conditions(&query, &entries, Strictness::Load)
        .unwrap_err();
    assert_eq!(err.kind(), VerdictKind::Fabrication);
    assert!(matches!(err, VerifyError::Fabricated { timestamp: 50, .. }));
}

#[test]
fn test_fabrication_wins_over_field_mismatch() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c");
    let mut entries = fx.entries_at(&[300, 250]);
    entries[1].message = "never written".to_string();
    entries[1].is_sitting = true;

    for strictness in [Strictness::Load, Strictness::Prepare] {
        assert_eq!(
            kind(fx.check_conditions(&query, &entries, strictness)),
            VerdictKind::Fabrication
        );
    }
}

#[test]
fn test_gap_tolerated_only_under_load() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c");
    let entries = fx.entries_at(&[300, 100]);

    assert!(fx.check_conditions(&query, &entries, Strictness::Load).is_ok());
    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Prepare)),
        VerdictKind::DataMismatch
    );
}

#[test]
fn test_lagging_head_tolerated_only_under_load() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c");
    // Target has not caught up with the write at 300 yet
    let entries = fx.entries_at(&[200, 100]);

    assert!(fx.check_conditions(&query, &entries, Strictness::Load).is_ok());
    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Prepare)),
        VerdictKind::DataMismatch
    );
}

#[test]
fn test_end_time_is_exclusive() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(300, "i,w,c");

    let entries = fx.entries_at(&[300]);
    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::Fabrication
    );

    let entries = fx.entries_at(&[200, 100]);
    assert!(fx.check_conditions(&query, &entries, Strictness::Prepare).is_ok());
}

#[test]
fn test_limit_exceeded_is_invalid_structure() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_limit(2);
    let entries = fx.entries_at(&[300, 200, 100]);

    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_default_limit_applies_without_explicit_limit() {
    let fx = fixture();
    let entity = fx.add_entity(1, UUID, CATEGORIES[0]);
    entity.record_conditions((1..=25).map(|n| info(1, n * 10)));

    let query = ConditionQuery::new(i64::MAX, "i,w,c");
    let timestamps: Vec<i64> = (1..=25).rev().map(|n| n * 10).collect();
    let entries = fx.entries_at(&timestamps);
    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::InvalidStructure
    );

    let entries = fx.target.conditions(UUID, &query).unwrap();
    assert_eq!(entries.len(), 20);
    assert!(fx.check_conditions(&query, &entries, Strictness::Prepare).is_ok());
}

#[test]
fn test_entry_before_start_time_is_invalid_structure() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_start_time(150);
    let entries = fx.entries_at(&[300, 200, 100]);

    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_prepare_short_page_must_be_exhaustive() {
    let fx = Fixture::with_three_records();
    let entries = fx.entries_at(&[300, 200]);

    let query = ConditionQuery::new(301, "i,w,c").with_limit(10);
    assert_eq!(
        kind(fx.check_conditions(&query, &entries, Strictness::Prepare)),
        VerdictKind::InvalidStructure
    );
    assert!(fx.check_conditions(&query, &entries, Strictness::Load).is_ok());

    // 100 is outside the window, so the short page is complete
    let windowed = query.with_start_time(150);
    assert!(fx
        .check_conditions(&windowed, &entries, Strictness::Prepare)
        .is_ok());
}

#[test]
fn test_full_page_need_not_be_exhaustive() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c").with_limit(2);
    let entries = fx.entries_at(&[300, 200]);

    assert!(fx.check_conditions(&query, &entries, Strictness::Prepare).is_ok());
}

#[test]
fn test_level_filter_restricts_matches() {
    let fx = fixture();
    let entity = fx.add_entity(1, UUID, CATEGORIES[0]);
    entity.record_condition(info(1, 100));
    entity.record_condition(record(1, 200, ConditionFlags::new(true, true, true), false));
    entity.record_condition(record(1, 300, ConditionFlags::new(true, false, false), true));

    let critical = ConditionQuery::new(301, "c");
    let entries = fx.target.conditions(UUID, &critical).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].condition_level, "critical");
    assert!(fx
        .check_conditions(&critical, &entries, Strictness::Prepare)
        .is_ok());

    // A warning record is not part of a critical-only listing
    let entries = fx.entries_at(&[300]);
    assert_eq!(
        kind(fx.check_conditions(&critical, &entries, Strictness::Load)),
        VerdictKind::Fabrication
    );

    let mixed = ConditionQuery::new(301, "i,w");
    let entries = fx.entries_at(&[300, 100]);
    assert!(fx.check_conditions(&mixed, &entries, Strictness::Prepare).is_ok());
}

#[test]
fn test_field_mismatches_are_data_mismatch() {
    let fx = fixture();
    let entity = fx.add_entity(1, UUID, CATEGORIES[0]);
    entity.record_condition(record(1, 100, ConditionFlags::new(false, true, false), true));
    let query = ConditionQuery::new(101, "i,w,c");
    let pristine = fx.entries_at(&[100]);

    let tampered: [fn(&mut ConditionEntry); 6] = [
        |e: &mut ConditionEntry| {
            e.condition = "is_dirty=true,is_overweight=true,is_broken=false".to_string()
        },
        |e: &mut ConditionEntry| e.condition_level = "info".to_string(),
        |e: &mut ConditionEntry| e.is_sitting = false,
        |e: &mut ConditionEntry| e.entity_uuid = "another".to_string(),
        |e: &mut ConditionEntry| e.message = "altered".to_string(),
        |e: &mut ConditionEntry| e.entity_name = "renamed".to_string(),
    ];
    for tamper in tampered {
        let mut entries = pristine.clone();
        tamper(&mut entries[0]);
        assert_eq!(
            kind(fx.check_conditions(&query, &entries, Strictness::Prepare)),
            VerdictKind::DataMismatch,
            "{:?}",
            entries[0]
        );
    }
}

#[test]
fn test_field_mismatch_names_the_field() {
    let fx = Fixture::with_three_records();
    let query = ConditionQuery::new(301, "i,w,c");
    let mut entries = fx.entries_at(&[300]);
    entries[0].message = "altered".to_string();

    let err = fx
        .check_conditions(&query, &entries, Strictness::Load)
        .unwrap_err();
    let VerifyError::DataMismatch { reason, .. } = &err else {
        panic!("expected data mismatch, got {:?}", err);
    };
    assert!(reason.contains("message"));
    assert!(reason.contains("altered"));
}

#[test]
fn test_empty_list_on_empty_log() {
    let fx = fixture();
    fx.add_entity(1, UUID, CATEGORIES[0]);
    let query = ConditionQuery::new(i64::MAX, "i,w,c");

    assert!(fx.check_conditions(&query, &[], Strictness::Prepare).is_ok());
}

#[test]
fn test_unregistered_entity_is_internal() {
    let fx = fixture();
    let query = ConditionQuery::new(301, "i,w,c");

    assert_eq!(
        kind(fx.check_conditions(&query, &[], Strictness::Load)),
        VerdictKind::Internal
    );
}

// Graph

fn graph_fixture() -> Fixture {
    let fx = fixture();
    let entity = fx.add_entity(1, UUID, CATEGORIES[0]);
    entity.record_conditions([
        record(1, DAY + 60, ConditionFlags::new(true, false, false), true),
        record(1, DAY + 120, ConditionFlags::default(), false),
        record(1, DAY + 3600 + 10, ConditionFlags::new(false, false, true), true),
        record(1, DAY + 5 * 3600, ConditionFlags::default(), true),
    ]);
    fx
}

fn check_graph(
    fx: &Fixture,
    buckets: &[GraphBucket],
    strictness: Strictness,
) -> Result<(), VerifyError> {
    let res = response("/api/isu/0694e4d7-dfce-4aec-b7ca-887ac42cfb8f/graph");
    fx.verifier
        .verify_graph(&res, UUID, &GraphQuery { date: DAY }, buckets, strictness)
}

fn rendered_graph(fx: &Fixture) -> Vec<GraphBucket> {
    fx.target.graph(UUID, &GraphQuery { date: DAY }).unwrap()
}

#[test]
fn test_reference_graph_passes() {
    let fx = graph_fixture();
    let buckets = rendered_graph(&fx);

    assert_eq!(buckets.len(), 24);
    assert_eq!(buckets[0].condition_timestamps, vec![DAY + 60, DAY + 120]);
    assert!(buckets[2].data.is_none());
    assert!(check_graph(&fx, &buckets, Strictness::Prepare).is_ok());
}

#[test]
fn test_broken_bucket_contiguity_is_invalid_structure() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[5].start_at += 60;
    buckets[5].end_at += 60;

    let err = check_graph(&fx, &buckets, Strictness::Load).unwrap_err();
    let VerifyError::InvalidStructure { reason, .. } = &err else {
        panic!("expected invalid structure, got {:?}", err);
    };
    assert!(reason.contains("ordering"));
}

#[test]
fn test_bucket_with_wrong_span_is_invalid_structure() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[23].end_at += 60;

    let err = check_graph(&fx, &buckets, Strictness::Load).unwrap_err();
    let VerifyError::InvalidStructure { reason, .. } = &err else {
        panic!("expected invalid structure, got {:?}", err);
    };
    assert!(reason.contains("does not span"), "{}", reason);
}

#[test]
fn test_extreme_bucket_bounds_are_invalid_structure() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[23].start_at = i64::MIN;
    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::InvalidStructure
    );

    let mut buckets = rendered_graph(&fx);
    buckets[23].start_at = i64::MAX - 1;
    buckets[23].end_at = i64::MAX;
    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_wrong_bucket_count_is_invalid_structure() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets.pop();

    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_graph_for_other_day_is_invalid_structure() {
    let fx = graph_fixture();
    let buckets = fx
        .target
        .graph(UUID, &GraphQuery { date: DAY + 86_400 })
        .unwrap();

    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_wrong_aggregate_is_data_mismatch() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    let data = buckets[1].data.as_mut().unwrap();
    data.detail.is_broken = false;

    let err = check_graph(&fx, &buckets, Strictness::Load).unwrap_err();
    assert_eq!(err.kind(), VerdictKind::DataMismatch);
    assert!(err.to_string().contains("is_broken"));
}

#[test]
fn test_omitted_aggregate_skips_comparison() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[0].data = None;

    assert!(check_graph(&fx, &buckets, Strictness::Prepare).is_ok());
}

#[test]
fn test_timestamp_outside_bucket_is_invalid_structure() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[0].condition_timestamps.push(DAY + 3600 + 10);

    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::InvalidStructure
    );
}

#[test]
fn test_unwritten_bucket_timestamp_is_fabrication() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[0].condition_timestamps.push(DAY + 900);

    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::Fabrication
    );
}

#[test]
fn test_descending_bucket_timestamps_is_ordering_error() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    buckets[0].condition_timestamps.reverse();

    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Load)),
        VerdictKind::Ordering
    );
}

#[test]
fn test_bucket_missing_condition_tolerated_only_under_load() {
    let fx = graph_fixture();
    let mut buckets = rendered_graph(&fx);
    // Drop the newer of the two conditions of the first bucket, and its data
    buckets[0].condition_timestamps.pop();
    buckets[0].data = None;

    assert!(check_graph(&fx, &buckets, Strictness::Load).is_ok());
    assert_eq!(
        kind(check_graph(&fx, &buckets, Strictness::Prepare)),
        VerdictKind::DataMismatch
    );
}

// Trend

/// One entity per category, entity `n + 1` in category `n`, each with two records
fn trend_fixture() -> Fixture {
    let fx = fixture();
    for (n, category) in CATEGORIES.iter().enumerate() {
        let id = n as i64 + 1;
        let entity = fx.add_entity(id, &format!("uuid-{}", id), category);
        entity.record_condition(info(id, 1000 + id));
        let dirty = ConditionFlags::new(true, false, false);
        entity.record_condition(record(id, 2000 + id, dirty, false));
    }
    fx
}

fn check_trend(fx: &Fixture, entries: &[TrendEntry]) -> Result<(), VerifyError> {
    fx.verifier.verify_trend(&response("/api/trend"), entries)
}

#[test]
fn test_reference_trend_passes() {
    let fx = trend_fixture();
    let entries = fx.target.trend();

    assert_eq!(entries.len(), CATEGORIES.len());
    assert!(check_trend(&fx, &entries).is_ok());
}

#[test]
fn test_trend_missing_category_is_invalid_structure() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    entries.pop();

    let err = check_trend(&fx, &entries).unwrap_err();
    assert_eq!(err.kind(), VerdictKind::InvalidStructure);
    assert!(err.to_string().contains(CATEGORIES[24]));
}

#[test]
fn test_trend_unknown_category_is_invalid_structure() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    entries.push(TrendEntry {
        category: "unknown".to_string(),
        conditions: Vec::new(),
    });

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::InvalidStructure);
}

#[test]
fn test_trend_duplicate_entity_is_data_mismatch() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    let repeated = entries[3].conditions[0].clone();
    entries[3].conditions.push(repeated);

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::DataMismatch);
}

#[test]
fn test_trend_unregistered_entity_is_data_mismatch() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    entries[0].conditions.push(TrendCondition {
        entity_id: 999,
        timestamp: 0,
        condition_level: "info".to_string(),
    });

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::DataMismatch);
}

#[test]
fn test_trend_entity_under_wrong_category_is_data_mismatch() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    let moved = entries[0].conditions.remove(0);
    entries[1].conditions.push(moved);

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::DataMismatch);
}

#[test]
fn test_trend_ascending_conditions_is_ordering_error() {
    let fx = trend_fixture();
    let extra = fx.add_entity(100, "uuid-100", CATEGORIES[0]);
    extra.record_condition(info(100, 5000));

    let mut entries = fx.target.trend();
    assert_eq!(entries[0].conditions.len(), 2);
    assert!(check_trend(&fx, &entries).is_ok());

    entries[0].conditions.reverse();
    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::Ordering);
}

#[test]
fn test_trend_unwritten_timestamp_is_fabrication() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    entries[2].conditions[0].timestamp += 1;

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::Fabrication);
}

#[test]
fn test_trend_older_condition_accepted() {
    // A target that lags behind may report an older record
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    let condition = &mut entries[0].conditions[0];
    condition.timestamp = 1001;
    condition.condition_level = "info".to_string();

    assert!(check_trend(&fx, &entries).is_ok());
}

#[test]
fn test_trend_unknown_level_is_invalid_structure() {
    let fx = trend_fixture();
    let mut entries = fx.target.trend();
    entries[0].conditions[0].condition_level = "fatal".to_string();

    assert_eq!(kind(check_trend(&fx, &entries)), VerdictKind::InvalidStructure);
}

// Static resources

const INDEX_JS: &[u8] = b"console.log('condition');";

fn resource_fixture() -> Fixture {
    let mut config = LoadcheckConfig::default();
    config.resources.digests.insert(
        "/assets/index.js".to_string(),
        format!("{:x}", Md5::digest(INDEX_JS)),
    );
    fixture_with(config)
}

fn fetched(
    path: &str,
    status: StatusCode,
    body: &[u8],
) -> (String, Result<ObservedResponse, FetchError>) {
    let url = Url::parse(BASE).unwrap().join(path).unwrap();
    (
        url.to_string(),
        Ok(ObservedResponse::new(Method::GET, url, status).with_body(body.to_vec())),
    )
}

fn all_resources() -> Resources {
    [
        fetched("/assets/favicon.svg", StatusCode::OK, b"<svg/>"),
        fetched("/assets/index.css", StatusCode::OK, b"body {}"),
        fetched("/assets/index.js", StatusCode::OK, INDEX_JS),
        fetched("/assets/vendor.js", StatusCode::OK, b"vendor"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_resources_all_matching() {
    let fx = resource_fixture();
    let errors = fx
        .verifier
        .verify_resources("/signup", &response("/signup"), &all_resources());

    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_cached_resource_passes_and_bad_digest_fails() {
    let fx = resource_fixture();
    let mut resources = all_resources();
    resources.extend([
        fetched("/assets/favicon.svg", StatusCode::NOT_MODIFIED, b""),
        fetched("/assets/index.js", StatusCode::OK, b"tampered"),
    ]);

    let errors = fx
        .verifier
        .verify_resources("/login", &response("/login"), &resources);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), VerdictKind::Checksum);
    assert!(matches!(
        &errors[0],
        VerifyError::Checksum { resource, .. } if resource == "/assets/index.js"
    ));
}

#[test]
fn test_cached_resource_skips_digest() {
    let fx = resource_fixture();
    let mut resources = all_resources();
    resources.extend([fetched("/assets/index.js", StatusCode::NOT_MODIFIED, b"")]);

    let errors = fx
        .verifier
        .verify_resources("/isu", &response("/isu/abc"), &resources);
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_every_failing_resource_is_reported() {
    let fx = resource_fixture();
    let mut resources = all_resources();
    resources.extend([
        fetched("/assets/index.js", StatusCode::OK, b"tampered"),
        fetched("/assets/vendor.js", StatusCode::INTERNAL_SERVER_ERROR, b""),
    ]);
    resources.remove("http://target.test/assets/index.css");

    let errors = fx
        .verifier
        .verify_resources("/register", &response("/register"), &resources);

    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.is_fatal()));
    let kinds: Vec<VerdictKind> = errors.iter().map(|e| e.kind()).collect();
    assert!(kinds.contains(&VerdictKind::Shape));
    assert_eq!(
        kinds.iter().filter(|k| **k == VerdictKind::Checksum).count(),
        2
    );
    assert!(errors.iter().any(|e| matches!(
        e,
        VerifyError::Checksum { resource, reason }
            if resource == "/assets/index.css" && reason.contains("not loaded")
    )));
}

#[test]
fn test_transient_fetch_failure_is_retryable() {
    let fx = resource_fixture();
    let mut resources = all_resources();
    resources.insert(
        "http://target.test/assets/vendor.js".to_string(),
        Err(FetchError::new(FetchErrorKind::Timeout, "operation timed out")),
    );

    let errors = fx
        .verifier
        .verify_resources("/condition", &response("/condition"), &resources);

    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_retryable());
    assert!(!errors[0].is_fatal());
}

#[test]
fn test_hard_fetch_failure_is_checksum() {
    let fx = resource_fixture();
    let mut resources = all_resources();
    resources.insert(
        "http://target.test/assets/vendor.js".to_string(),
        Err(FetchError::new(FetchErrorKind::Other, "invalid chunk")),
    );

    let errors = fx
        .verifier
        .verify_resources("/signup", &response("/signup"), &resources);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), VerdictKind::Checksum);
    assert!(matches!(
        &errors[0],
        VerifyError::Checksum { resource, .. } if resource == "/assets/vendor.js"
    ));
}

#[test]
fn test_unknown_page_is_internal() {
    let fx = resource_fixture();
    let errors = fx
        .verifier
        .verify_resources("/nowhere", &response("/nowhere"), &all_resources());

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), VerdictKind::Internal);
}

// Entity listing

fn listing_fixture() -> Fixture {
    let fx = fixture();
    for id in 1..=3 {
        fx.add_entity(id, &format!("uuid-{}", id), CATEGORIES[id as usize]);
    }
    fx
}

#[test]
fn test_listing_newest_first_passes() {
    let fx = listing_fixture();
    let expected = fx.registry.owned_by("alice");
    let actual = fx.target.entity_listing("alice");

    assert_eq!(actual[0].id, 3);
    let errors = fx
        .verifier
        .verify_entity_listing(&response("/api/isu"), &expected, &actual);
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_listing_swapped_entities_reported_per_position() {
    let fx = listing_fixture();
    let expected = fx.registry.owned_by("alice");
    let mut actual = fx.target.entity_listing("alice");
    actual.swap(0, 1);

    let errors = fx
        .verifier
        .verify_entity_listing(&response("/api/isu"), &expected, &actual);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind() == VerdictKind::DataMismatch));
}

#[test]
fn test_listing_wrong_count_is_single_mismatch() {
    let fx = listing_fixture();
    let expected = fx.registry.owned_by("alice");
    let mut actual = fx.target.entity_listing("alice");
    actual.pop();

    let errors = fx
        .verifier
        .verify_entity_listing(&response("/api/isu"), &expected, &actual);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_listing_wrong_details() {
    let fx = listing_fixture();
    let expected = fx.registry.owned_by("alice");
    let mut actual = fx.target.entity_listing("alice");
    actual[2].name = "renamed".to_string();

    let errors = fx
        .verifier
        .verify_entity_listing(&response("/api/isu"), &expected, &actual);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("uuid-1"));
}
