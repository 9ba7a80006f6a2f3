//! Keyed, single-use event store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;

use crate::bridge::event::{Event, RequestId};
use crate::bridge::{Bridge, BridgeError};
use crate::observability::metrics;

/// Pending events keyed by request id.
///
/// Cloning shares the underlying map. Consumption removes the entry, so an
/// id can be observed by at most one request even under concurrent lookups.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Arc<DashMap<RequestId, Event>>,
    next_id: Arc<AtomicU64>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Store a body under a freshly allocated id.
    pub fn stage(&self, body: impl Into<Bytes>) -> RequestId {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.insert(id, Event::new(body));
        id
    }

    /// Store an event under a caller-chosen id, replacing any pending one.
    pub fn insert(&self, id: RequestId, event: Event) {
        if self.events.insert(id, event).is_some() {
            tracing::warn!(request_id = %id, "Replaced pending bridge event");
        }
        metrics::record_pending_events(self.events.len());
    }

    /// Number of events not yet consumed.
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for EventStore {
    fn consume_event(&self, id: &RequestId) -> Result<Event, BridgeError> {
        let (_, event) = self
            .events
            .remove(id)
            .ok_or(BridgeError::UnknownRequest(*id))?;
        metrics::record_pending_events(self.events.len());
        Ok(event)
    }
}
