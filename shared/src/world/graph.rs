use std::collections::HashMap;

use crate::{BaselineScope, EntityId, EntityRecord, SlotArrangement, UNSLOTTED};

/// Upper bound on parent walks. A containment chain deeper than this can only
/// be the product of a racing writer creating a cycle.
pub const MAX_CONTAINMENT_DEPTH: usize = 64;

/// Read-only view over parent/child and slot relationships of world entities.
pub trait ContainmentGraph {
    fn record(&self, id: &EntityId) -> Option<&EntityRecord>;

    fn children(&self, id: &EntityId) -> Vec<EntityId>;

    fn parent(&self, id: &EntityId) -> Option<EntityId> {
        self.record(id).and_then(|record| record.parent)
    }

    fn slot(&self, id: &EntityId) -> SlotArrangement {
        self.record(id)
            .map(|record| record.slot_arrangement)
            .unwrap_or(UNSLOTTED)
    }

    fn baseline_scope(&self, id: &EntityId) -> BaselineScope {
        self.record(id)
            .map(|record| record.baseline_scope)
            .unwrap_or_default()
    }

    /// 0 for an uncontained entity, otherwise one more than its parent.
    fn depth(&self, id: &EntityId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            if depth >= MAX_CONTAINMENT_DEPTH {
                break;
            }
            current = self.parent(&parent);
        }
        depth
    }

    /// True if `ancestor` is `descendant` itself or contains it at any depth.
    fn is_ancestor_or_self(&self, descendant: &EntityId, ancestor: &EntityId) -> bool {
        let mut current = Some(*descendant);
        let mut steps = 0;
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            steps += 1;
            if steps > MAX_CONTAINMENT_DEPTH {
                return false;
            }
            current = self.parent(&id);
        }
        false
    }
}

/// Immutable copy of the part of the containment graph one flush looks at.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    records: HashMap<EntityId, EntityRecord>,
    children: HashMap<EntityId, Vec<EntityId>>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record, keeping the children index in step with its
    /// parent link.
    pub fn insert(&mut self, record: EntityRecord) {
        let id = record.id;
        let new_parent = record.parent;
        if let Some(old) = self.records.insert(id, record) {
            if old.parent != new_parent {
                if let Some(old_parent) = old.parent {
                    if let Some(siblings) = self.children.get_mut(&old_parent) {
                        siblings.retain(|child| *child != id);
                    }
                }
            }
        }
        if let Some(parent) = new_parent {
            let siblings = self.children.entry(parent).or_default();
            if !siblings.contains(&id) {
                siblings.push(id);
            }
        }
    }

    /// Adds `record` only when the snapshot has nothing for its id yet.
    pub fn insert_if_absent(&mut self, record: EntityRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.insert(record);
        true
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContainmentGraph for GraphSnapshot {
    fn record(&self, id: &EntityId) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    fn children(&self, id: &EntityId) -> Vec<EntityId> {
        self.children.get(id).cloned().unwrap_or_default()
    }
}

impl FromIterator<EntityRecord> for GraphSnapshot {
    fn from_iter<I: IntoIterator<Item = EntityRecord>>(iter: I) -> Self {
        let mut snapshot = GraphSnapshot::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}
