use crate::condition::ConditionRecord;
use crate::store::ConditionStore;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub mod category;
pub use category::{Category, CategorySet, UnknownCategory, CATEGORIES};


/// A tracked device whose condition log the harness maintains.
#[derive(Debug)]
pub struct Entity {
    /// Internal numeric identifier (echoed by trend responses)
    pub id: i64,
    /// External identifier (used in request paths and list responses)
    pub uuid: String,
    /// Display name the target must echo back
    pub name: String,
    /// Category the entity belongs to in trend responses
    pub category: String,
    /// Owning user
    pub owner: String,
    conditions: RwLock<ConditionStore>,
}

impl Entity {
    pub fn new(
        id: i64,
        uuid: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id,
            uuid: uuid.into(),
            name: name.into(),
            category: category.into(),
            owner: owner.into(),
            conditions: RwLock::new(ConditionStore::new()),
        }
    }

    /// Record a condition the target accepted.
    ///
    /// Holds the write lock only for the single insert.
    pub fn record_condition(&self, record: ConditionRecord) {
        let mut store = self
            .conditions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        store.insert(record);
    }

    /// Record a batch of accepted conditions under one write lock.
    pub fn record_conditions(&self, records: impl IntoIterator<Item = ConditionRecord>) {
        let mut store = self
            .conditions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for record in records {
            store.insert(record);
        }
    }

    /// Run `f` against the condition log under the shared lock.
    ///
    /// Cursors borrow the store, so they are built and consumed inside `f`
    /// and writers stay blocked until `f` returns.
    pub fn with_conditions<R>(&self, f: impl FnOnce(&ConditionStore) -> R) -> R {
        let store = self
            .conditions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&store)
    }

    pub fn condition_count(&self) -> usize {
        self.with_conditions(|store| store.len())
    }
}

/// Process-wide lookup of entities by internal ID and by external UUID.
///
/// Built during setup and shared by `Arc` with every writer and validator.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    by_id: DashMap<i64, Arc<Entity>>,
    by_uuid: DashMap<String, Arc<Entity>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. An entity already registered under the same ID or
    /// UUID is replaced, and its other key stops resolving.
    pub fn register(&self, entity: Entity) -> Arc<Entity> {
        let entity = Arc::new(entity);
        let replaced_by_id = self.by_id.insert(entity.id, Arc::clone(&entity));
        let replaced_by_uuid = self.by_uuid.insert(entity.uuid.clone(), Arc::clone(&entity));

        if let Some(old) = replaced_by_id.filter(|old| old.uuid != entity.uuid) {
            self.by_uuid.remove_if(&old.uuid, |_, e| Arc::ptr_eq(e, &old));
        }
        if let Some(old) = replaced_by_uuid.filter(|old| old.id != entity.id) {
            self.by_id.remove_if(&old.id, |_, e| Arc::ptr_eq(e, &old));
        }

        debug!(entity_id = entity.id, uuid = %entity.uuid, "Entity registered");
        entity
    }

    pub fn get_by_id(&self, id: i64) -> Option<Arc<Entity>> {
        self.by_id.get(&id).map(|e| Arc::clone(e.value()))
    }

    pub fn get_by_uuid(&self, uuid: &str) -> Option<Arc<Entity>> {
        self.by_uuid.get(uuid).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All registered entities, ordered by internal ID.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        let mut all: Vec<Arc<Entity>> = self
            .by_id
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        all.sort_by_key(|e| e.id);
        all
    }

    /// Entities owned by `owner`, newest registration (highest ID) first.
    pub fn owned_by(&self, owner: &str) -> Vec<Arc<Entity>> {
        let mut owned: Vec<Arc<Entity>> = self
            .by_id
            .iter()
            .filter(|e| e.value().owner == owner)
            .map(|e| Arc::clone(e.value()))
            .collect();
        owned.sort_by_key(|e| std::cmp::Reverse(e.id));
        owned
    }
}
