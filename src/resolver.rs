//! Entity resolution.
//!
//! The `EntityLookup` trait is the consumed external capability: the store
//! is queried lazily, once per entity per parse call. The per-parse
//! working set is a dense arena of touched entities plus a key-to-index
//! map (with synthetic keys for unpersisted CREATE items) and the `LAST`
//! handle.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{BatchError, BoxError};
use crate::model::{EntityDocument, EntityId};

/// External store the engine fetches referenced entities from.
///
/// Implementations may block on I/O. The engine never retries; retry and
/// timeout policy belong to the implementation or its caller.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Returns `Ok(None)` when no entity exists under `id`.
    async fn lookup(&self, id: &EntityId) -> Result<Option<EntityDocument>, BoxError>;
}

#[async_trait]
impl<'a, T: EntityLookup + ?Sized> EntityLookup for &'a T {
    async fn lookup(&self, id: &EntityId) -> Result<Option<EntityDocument>, BoxError> {
        (**self).lookup(id).await
    }
}

/// In-memory lookup over a fixed set of entities, for tests and small
/// stores.
#[derive(Debug, Default)]
pub struct InMemoryEntityLookup {
    entities: HashMap<EntityId, EntityDocument>,
}

impl InMemoryEntityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a persisted entity. Entities without an id cannot be looked
    /// up and are ignored.
    pub fn insert(&mut self, entity: EntityDocument) {
        if let Some(id) = entity.id() {
            self.entities.insert(id, entity);
        }
    }
}

#[async_trait]
impl EntityLookup for InMemoryEntityLookup {
    async fn lookup(&self, id: &EntityId) -> Result<Option<EntityDocument>, BoxError> {
        Ok(self.entities.get(id).cloned())
    }
}

/// Key of an entity in the working set. Fresh CREATE items have no id yet
/// and get a synthetic key from their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WorkingKey {
    Persisted(EntityId),
    Fresh(usize),
}

/// The working set of one parse call. Entities are mutated in place via
/// their arena slot and never removed; the arena order is first-touched
/// order.
#[derive(Debug, Default)]
pub(crate) struct WorkingSet {
    arena: Vec<EntityDocument>,
    index: HashMap<WorkingKey, usize>,
    last_touched: Option<usize>,
    fresh: usize,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, unpersisted item and marks it last-touched.
    pub fn create(&mut self) -> usize {
        let slot = self.arena.len();
        self.arena.push(EntityDocument::new_item());
        self.index.insert(WorkingKey::Fresh(self.fresh), slot);
        self.fresh += 1;
        self.last_touched = Some(slot);
        log::debug!("created a fresh item at slot {slot}");
        slot
    }

    /// Resolves a line target to an arena slot. `None` is the `LAST`
    /// back-reference; an id is served from the working set or fetched
    /// from the store and cached. Either way the slot becomes last-touched.
    pub async fn resolve<L>(
        &mut self,
        target: Option<EntityId>,
        lookup: &L,
    ) -> Result<usize, BatchError>
    where
        L: EntityLookup + ?Sized,
    {
        let Some(id) = target else {
            return self
                .last_touched
                .ok_or_else(|| BatchError::resolution("LAST used before any entity referenced"));
        };

        if let Some(&slot) = self.index.get(&WorkingKey::Persisted(id)) {
            self.last_touched = Some(slot);
            return Ok(slot);
        }

        let entity = match lookup.lookup(&id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return Err(BatchError::resolution(format!("entity {id} does not exist"))),
            Err(err) => {
                log::debug!("lookup for {id} failed: {err}");
                return Err(BatchError::resolution(format!("entity {id} does not exist")));
            }
        };
        log::debug!("fetched {id} from the entity store");
        let slot = self.arena.len();
        self.arena.push(entity);
        self.index.insert(WorkingKey::Persisted(id), slot);
        self.last_touched = Some(slot);
        Ok(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> &mut EntityDocument {
        &mut self.arena[slot]
    }

    /// Hands the touched entities to the caller in first-touched order.
    pub fn into_entities(self) -> Vec<EntityDocument> {
        self.arena
    }
}
