use thiserror::Error;

use aware_shared::{ObserverKey, TransportError, WorldError};

/// Errors surfaced by the synchronization engines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwarenessError {
    /// A directive could not be handed to the observer's connection; the rest
    /// of that flush was abandoned
    #[error("Flush for {observer} aborted: {source}")]
    Transport {
        observer: ObserverKey,
        #[source]
        source: TransportError,
    },

    /// The containment graph could not be read
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// No engine is registered for the observer
    #[error("Observer {observer} is not registered")]
    ObserverNotFound { observer: ObserverKey },

    /// A thread panicked while holding an engine lock
    #[error("Synchronization lock for {observer} poisoned")]
    LockPoisoned { observer: ObserverKey },
}
