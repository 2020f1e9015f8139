use std::{fmt, sync::Arc};

use aware_shared::{EntityId, EntityKind, EntityRecord, ObserverKey, Transport};

/// Callbacks an observer receives as entities enter and leave its client's
/// view. Invoked while the observer's synchronization lock is held.
pub trait ObserverHooks: Send + Sync {
    fn on_entered_visibility(&self, _entity: &EntityRecord) {}

    fn on_exited_visibility(&self, _entity: &EntityRecord) {}

    /// PvP flags this observer sees on a creature
    fn pvp_flags_for(&self, target: &EntityRecord) -> u32 {
        match &target.kind {
            EntityKind::Creature(state) => state.pvp_flags,
            _ => 0,
        }
    }
}

/// Hooks that ignore every notification
pub struct NoopHooks;

impl ObserverHooks for NoopHooks {}

/// A session whose client view is kept in sync with the server.
#[derive(Clone)]
pub struct Observer {
    key: ObserverKey,
    entity: EntityId,
    companion: Option<EntityId>,
    logged_in: bool,
    hooks: Arc<dyn ObserverHooks>,
    connection: Option<Arc<dyn Transport>>,
}

impl Observer {
    /// An observer without a network presence, e.g. a non-player creature
    pub fn new(key: ObserverKey, entity: EntityId) -> Self {
        Self {
            key,
            entity,
            companion: None,
            logged_in: false,
            hooks: Arc::new(NoopHooks),
            connection: None,
        }
    }

    /// A logged-in client controlling `entity`, whose companion must always
    /// be known to that client
    pub fn player(
        key: ObserverKey,
        entity: EntityId,
        companion: EntityId,
        connection: Arc<dyn Transport>,
    ) -> Self {
        Self {
            key,
            entity,
            companion: Some(companion),
            logged_in: true,
            hooks: Arc::new(NoopHooks),
            connection: Some(connection),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ObserverHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_connection(mut self, connection: Arc<dyn Transport>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_companion(mut self, companion: EntityId) -> Self {
        self.companion = Some(companion);
        self
    }

    pub fn logged_in(mut self, logged_in: bool) -> Self {
        self.logged_in = logged_in;
        self
    }

    pub fn key(&self) -> ObserverKey {
        self.key
    }

    /// The entity this observer controls
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn companion(&self) -> Option<EntityId> {
        self.companion
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn hooks(&self) -> &dyn ObserverHooks {
        self.hooks.as_ref()
    }

    pub fn connection(&self) -> Option<&Arc<dyn Transport>> {
        self.connection.as_ref()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("key", &self.key)
            .field("entity", &self.entity)
            .field("companion", &self.companion)
            .field("logged_in", &self.logged_in)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}
