#![cfg(test)]

use std::sync::Mutex;

use aware_shared::{Directive, EntityId, EntityRecord, GraphSnapshot, Transport, TransportError};


pub(crate) fn id(value: u64) -> EntityId {
    EntityId::from_u64(value)
}

pub(crate) fn graph<I: IntoIterator<Item = EntityRecord>>(records: I) -> GraphSnapshot {
    records.into_iter().collect()
}

/// Collects directives, optionally refusing everything after the first
/// `fail_after` sends. `aware-test` links against this crate, so unit tests
/// cannot borrow its `RecordingTransport` without building a second copy of
/// `aware-server` whose types would not match the ones under test.
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<Directive>>,
    fail_after: Option<usize>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    pub(crate) fn failing_after(sends: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_after: Some(sends),
        }
    }

    pub(crate) fn take(&self) -> Vec<Directive> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, directive: Directive) -> Result<(), TransportError> {
        let mut sent = self.sent.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if sent.len() >= limit {
                return Err(TransportError::ConnectionClosed {
                    entity_id: directive.entity(),
                });
            }
        }
        sent.push(directive);
        Ok(())
    }
}
