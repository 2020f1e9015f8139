use thiserror::Error;

use crate::EntityId;

/// Errors that can occur while mutating the containment graph arena
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Attempted to spawn an entity whose id is already taken
    #[error("Entity {entity_id} already exists in the world")]
    EntityAlreadyExists { entity_id: EntityId },

    /// Attempted to operate on an entity that doesn't exist
    #[error("Entity {entity_id} not found in the world")]
    EntityNotFound { entity_id: EntityId },

    /// Attempted to place an entity inside a container that doesn't exist
    #[error("Cannot place entity {entity_id} inside {parent_id} - container not found")]
    ParentNotFound {
        entity_id: EntityId,
        parent_id: EntityId,
    },

    /// Attempted to place an entity inside itself or one of its descendants
    #[error("Cannot place entity {entity_id} inside {parent_id} - it would contain itself")]
    ContainmentCycle {
        entity_id: EntityId,
        parent_id: EntityId,
    },

    /// A thread panicked while holding the world lock
    #[error("World lock poisoned")]
    LockPoisoned,
}
