use std::{
    collections::{BTreeSet, HashMap},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::debug;

use crate::{EntityId, Location, UpdateCount};

use super::{
    entity_record::EntityRecord, error::WorldError, graph::GraphSnapshot,
    graph::MAX_CONTAINMENT_DEPTH, subscribers::SubscriberRegistry,
};

#[derive(Default)]
struct WorldState {
    records: HashMap<EntityId, EntityRecord>,
    children: HashMap<EntityId, BTreeSet<EntityId>>,
}

impl WorldState {
    fn link(&mut self, child: EntityId, parent: Option<EntityId>) {
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().insert(child);
        }
    }

    fn unlink(&mut self, child: &EntityId, parent: Option<EntityId>) {
        let Some(parent) = parent else {
            return;
        };
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.remove(child);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    fn contains_within(&self, entity: &EntityId, ancestor: &EntityId) -> bool {
        let mut current = Some(*entity);
        let mut steps = 0;
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            steps += 1;
            if steps > MAX_CONTAINMENT_DEPTH {
                return true;
            }
            current = self.records.get(&id).and_then(|record| record.parent);
        }
        false
    }

    fn copy_into(&self, snapshot: &mut GraphSnapshot, id: &EntityId) {
        let mut current = Some(*id);
        let mut steps = 0;
        while let Some(id) = current {
            let Some(record) = self.records.get(&id) else {
                break;
            };
            if !snapshot.insert_if_absent(record.clone()) {
                break;
            }
            steps += 1;
            if steps > MAX_CONTAINMENT_DEPTH {
                break;
            }
            current = record.parent;
        }
    }
}

/// The authoritative containment graph: an arena of entity records indexed by
/// id, with parents stored as ids.
///
/// The synchronization core only reads it (through snapshots) and touches its
/// subscriber registry; everything else is done by the world simulation.
#[derive(Default)]
pub struct World {
    state: RwLock<WorldState>,
    subscribers: SubscriberRegistry,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WorldState>, WorldError> {
        self.state.read().map_err(|_| WorldError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WorldState>, WorldError> {
        self.state.write().map_err(|_| WorldError::LockPoisoned)
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn spawn(&self, record: EntityRecord) -> Result<(), WorldError> {
        let mut state = self.write()?;
        let entity_id = record.id;
        if state.records.contains_key(&entity_id) {
            return Err(WorldError::EntityAlreadyExists { entity_id });
        }
        if let Some(parent_id) = record.parent {
            if parent_id == entity_id {
                return Err(WorldError::ContainmentCycle {
                    entity_id,
                    parent_id,
                });
            }
            if !state.records.contains_key(&parent_id) {
                return Err(WorldError::ParentNotFound {
                    entity_id,
                    parent_id,
                });
            }
        }
        let parent = record.parent;
        state.records.insert(entity_id, record);
        state.link(entity_id, parent);
        Ok(())
    }

    /// Removes an entity together with everything it contains. Returns the
    /// removed ids, container first.
    pub fn despawn(&self, entity_id: &EntityId) -> Result<Vec<EntityId>, WorldError> {
        let mut state = self.write()?;
        let Some(parent) = state.records.get(entity_id).map(|record| record.parent) else {
            return Err(WorldError::EntityNotFound {
                entity_id: *entity_id,
            });
        };
        state.unlink(entity_id, parent);

        let mut removed = Vec::new();
        let mut pending = vec![*entity_id];
        while let Some(id) = pending.pop() {
            if state.records.remove(&id).is_none() {
                continue;
            }
            removed.push(id);
            if let Some(children) = state.children.remove(&id) {
                pending.extend(children.into_iter().rev());
            }
        }
        drop(state);

        for id in &removed {
            self.subscribers.remove_entity(id);
        }
        debug!("despawned {} entities rooted at {}", removed.len(), entity_id);
        Ok(removed)
    }

    /// Places an entity in a new container (or the open world) at `location`.
    pub fn move_entity(
        &self,
        entity_id: &EntityId,
        parent: Option<EntityId>,
        location: Location,
    ) -> Result<(), WorldError> {
        let mut state = self.write()?;
        let Some(old_parent) = state.records.get(entity_id).map(|record| record.parent) else {
            return Err(WorldError::EntityNotFound {
                entity_id: *entity_id,
            });
        };
        if let Some(parent_id) = parent {
            if !state.records.contains_key(&parent_id) {
                return Err(WorldError::ParentNotFound {
                    entity_id: *entity_id,
                    parent_id,
                });
            }
            if state.contains_within(&parent_id, entity_id) {
                return Err(WorldError::ContainmentCycle {
                    entity_id: *entity_id,
                    parent_id,
                });
            }
        }
        state.unlink(entity_id, old_parent);
        state.link(*entity_id, parent);
        if let Some(record) = state.records.get_mut(entity_id) {
            record.parent = parent;
            record.location = location;
        }
        Ok(())
    }

    /// Mutates a record in place. Containment must be changed through
    /// `move_entity`; a parent set here is ignored.
    pub fn update_record<F: FnOnce(&mut EntityRecord)>(
        &self,
        entity_id: &EntityId,
        update: F,
    ) -> Result<(), WorldError> {
        let mut state = self.write()?;
        let Some(record) = state.records.get_mut(entity_id) else {
            return Err(WorldError::EntityNotFound {
                entity_id: *entity_id,
            });
        };
        let parent = record.parent;
        update(record);
        record.id = *entity_id;
        record.parent = parent;
        Ok(())
    }

    pub fn record(&self, entity_id: &EntityId) -> Option<EntityRecord> {
        self.read().ok()?.records.get(entity_id).cloned()
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.read()
            .map(|state| state.records.contains_key(entity_id))
            .unwrap_or(false)
    }

    pub fn parent(&self, entity_id: &EntityId) -> Option<EntityId> {
        self.read().ok()?.records.get(entity_id)?.parent
    }

    pub fn children(&self, entity_id: &EntityId) -> Vec<EntityId> {
        let Ok(state) = self.read() else {
            return Vec::new();
        };
        state
            .children
            .get(entity_id)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|state| state.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Location of the outermost container of `entity_id`, or its own
    /// location when it is not contained.
    pub fn world_location(&self, entity_id: &EntityId) -> Option<Location> {
        let state = self.read().ok()?;
        let mut record = state.records.get(entity_id)?;
        let mut steps = 0;
        while let Some(parent) = record.parent {
            let Some(parent_record) = state.records.get(&parent) else {
                break;
            };
            record = parent_record;
            steps += 1;
            if steps > MAX_CONTAINMENT_DEPTH {
                break;
            }
        }
        Some(record.location)
    }

    /// Advances and returns the entity's transform update counter
    pub fn next_update_count(&self, entity_id: &EntityId) -> Result<UpdateCount, WorldError> {
        let mut state = self.write()?;
        let Some(record) = state.records.get_mut(entity_id) else {
            return Err(WorldError::EntityNotFound {
                entity_id: *entity_id,
            });
        };
        record.update_count = record.update_count.wrapping_add(1);
        Ok(record.update_count)
    }

    /// Copies every requested entity, all of its ancestors and its direct
    /// children into an immutable snapshot. Unknown ids are left out.
    pub fn snapshot<'i, I: IntoIterator<Item = &'i EntityId>>(
        &self,
        ids: I,
    ) -> Result<GraphSnapshot, WorldError> {
        let state = self.read()?;
        let mut snapshot = GraphSnapshot::new();
        for id in ids {
            state.copy_into(&mut snapshot, id);
            if let Some(children) = state.children.get(id) {
                for child in children {
                    if let Some(record) = state.records.get(child) {
                        snapshot.insert_if_absent(record.clone());
                    }
                }
            }
        }
        Ok(snapshot)
    }
}
