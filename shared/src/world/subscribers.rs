use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, RwLock},
};

use crate::{EntityId, ObserverKey};

type SubscriberSet = Arc<Mutex<HashSet<ObserverKey>>>;

/// Which observers receive state-change broadcasts for each entity.
///
/// Every entity has its own lock, so observers subscribing to different
/// entities never contend, and many observers may touch the same entity at
/// once.
#[derive(Default)]
pub struct SubscriberRegistry {
    entities: RwLock<HashMap<EntityId, SubscriberSet>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, entity: &EntityId) -> SubscriberSet {
        if let Ok(entities) = self.entities.read() {
            if let Some(set) = entities.get(entity) {
                return set.clone();
            }
        }
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entities.entry(*entity).or_default().clone()
    }

    fn existing(&self, entity: &EntityId) -> Option<SubscriberSet> {
        let entities = self
            .entities
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entities.get(entity).cloned()
    }

    /// Returns false if the observer was already subscribed
    pub fn add_subscriber(&self, entity: &EntityId, observer: ObserverKey) -> bool {
        let set = self.entry(entity);
        let mut set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.insert(observer)
    }

    /// Returns false if the observer was not subscribed
    pub fn remove_subscriber(&self, entity: &EntityId, observer: &ObserverKey) -> bool {
        let Some(set) = self.existing(entity) else {
            return false;
        };
        let mut set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(observer)
    }

    pub fn is_subscribed(&self, entity: &EntityId, observer: &ObserverKey) -> bool {
        let Some(set) = self.existing(entity) else {
            return false;
        };
        let set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.contains(observer)
    }

    pub fn subscribers(&self, entity: &EntityId) -> Vec<ObserverKey> {
        let Some(set) = self.existing(entity) else {
            return Vec::new();
        };
        let set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut output: Vec<ObserverKey> = set.iter().copied().collect();
        output.sort();
        output
    }

    pub fn subscriber_count(&self, entity: &EntityId) -> usize {
        let Some(set) = self.existing(entity) else {
            return 0;
        };
        let set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.len()
    }

    /// Drops all bookkeeping for an entity that left the world
    pub fn remove_entity(&self, entity: &EntityId) -> Vec<ObserverKey> {
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(set) = entities.remove(entity) else {
            return Vec::new();
        };
        let set = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.iter().copied().collect()
    }
}
