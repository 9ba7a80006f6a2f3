//! Bridge between the inbound transport and the request adapter.
//!
//! # Data Flow
//! ```text
//! inbound request body
//!     → EventStore::stage (allocates RequestId)
//!     → x-now-bridge-request-id header on the forwarded request
//!     → RequestAdapter consumes the Event by id (remove-on-read)
//! ```
//!
//! # Design Decisions
//! - Explicit keyed store instead of a process-wide cache
//! - An id is valid exactly once; a repeated or unknown id is an error,
//!   never an empty body

pub mod event;
pub mod store;

use thiserror::Error;

pub use event::{Event, RequestId, X_NOW_BRIDGE_REQUEST_ID};
pub use store::EventStore;

/// Errors surfaced while exchanging a request id for its event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The request carried no id header.
    #[error("missing bridge request id")]
    MissingRequestId,

    /// The id header is not a decimal integer.
    #[error("invalid bridge request id: {0:?}")]
    InvalidRequestId(String),

    /// No pending event for this id, or it was already consumed.
    #[error("no pending event for request {0}")]
    UnknownRequest(RequestId),
}

/// Source of request bodies keyed by single-use ids.
pub trait Bridge: Send + Sync + 'static {
    /// Remove and return the event for `id`.
    fn consume_event(&self, id: &RequestId) -> Result<Event, BridgeError>;
}

impl<B: Bridge> Bridge for std::sync::Arc<B> {
    fn consume_event(&self, id: &RequestId) -> Result<Event, BridgeError> {
        (**self).consume_event(id)
    }
}
