use aware_shared::{EntityId, ObserverKey};

use crate::server::AwarenessServer;

pub struct ObserverScopeRef<'s> {
    server: &'s AwarenessServer,
    key: ObserverKey,
}

impl<'s> ObserverScopeRef<'s> {
    pub(crate) fn new(server: &'s AwarenessServer, key: &ObserverKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> ObserverKey {
        self.key
    }

    /// Returns true if the Observer's client currently knows the Entity
    pub fn has(&self, entity: &EntityId) -> bool {
        self.server
            .engine(&self.key)
            .map(|engine| engine.is_visible(entity))
            .unwrap_or(false)
    }

    /// Returns how many Entities the Observer's client currently knows
    pub fn count(&self) -> usize {
        self.server
            .engine(&self.key)
            .map(|engine| engine.visible_count())
            .unwrap_or(0)
    }

    /// Returns the Entities the Observer's client currently knows, sorted by id
    pub fn entities(&self) -> Vec<EntityId> {
        self.server
            .engine(&self.key)
            .map(|engine| engine.visible_entities())
            .unwrap_or_default()
    }
}
