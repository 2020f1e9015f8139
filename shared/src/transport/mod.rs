pub mod error;

use crate::Directive;

use self::error::TransportError;

/// Point-to-point connection to one observer's client.
///
/// Delivery is assumed reliable and ordered; `send` is called while the
/// observer's synchronization lock is held, so it must not call back into
/// that observer's engine.
pub trait Transport: Send + Sync {
    fn send(&self, directive: Directive) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, directive: Directive) -> Result<(), TransportError> {
        (**self).send(directive)
    }
}
