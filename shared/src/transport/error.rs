use thiserror::Error;

use crate::EntityId;

/// Errors that can occur while handing a directive to an observer's connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection went away before or during the send
    #[error("Connection closed while sending directive for entity {entity_id}")]
    ConnectionClosed { entity_id: EntityId },

    /// The connection refused the directive
    #[error("Failed to send {directive} for entity {entity_id}: {reason}")]
    SendFailed {
        directive: &'static str,
        entity_id: EntityId,
        reason: String,
    },
}
