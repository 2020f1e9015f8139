use std::sync::Mutex;

use aware_shared::{Directive, Transport, TransportError};

/// In-memory connection that records every directive handed to it.
/// Can be told to start refusing directives after a number of sends.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Directive>>,
    remaining: Mutex<Option<usize>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `sends` more directives, then refuse everything
    pub fn fail_after(&self, sends: usize) {
        *self.remaining.lock().unwrap() = Some(sends);
    }

    pub fn heal(&self) {
        *self.remaining.lock().unwrap() = None;
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<Directive> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, directive: Directive) -> Result<(), TransportError> {
        let mut remaining = self.remaining.lock().unwrap();
        if let Some(remaining) = remaining.as_mut() {
            if *remaining == 0 {
                return Err(TransportError::ConnectionClosed {
                    entity_id: directive.entity(),
                });
            }
            *remaining -= 1;
        }
        self.sent.lock().unwrap().push(directive);
        Ok(())
    }
}
