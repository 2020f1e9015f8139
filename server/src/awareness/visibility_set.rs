use std::collections::{hash_map::Values, HashMap, HashSet};

use aware_shared::{EntityId, EntityRecord};

/// The entities an observer's client currently knows about.
///
/// Each member keeps the record it had when it was last synchronized, so an
/// entity that has since vanished from the world can still be ordered and
/// destroyed correctly. The map keys double as the O(1) id index.
#[derive(Default)]
pub struct VisibilitySet {
    entities: HashMap<EntityId, EntityRecord>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityRecord> {
        self.entities.get(id)
    }

    /// Returns false if the entity was already visible; its cached record is
    /// refreshed either way
    pub fn insert(&mut self, record: EntityRecord) -> bool {
        self.entities.insert(record.id, record).is_none()
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<EntityRecord> {
        self.entities.remove(id)
    }

    /// Empties the set, handing back everything it held
    pub fn drain(&mut self) -> Vec<EntityRecord> {
        self.entities.drain().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn records(&self) -> Values<'_, EntityId, EntityRecord> {
        self.entities.values()
    }

    /// Immutable copy of the member ids, taken before a flush mutates the set
    pub fn snapshot_ids(&self) -> HashSet<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }
}
