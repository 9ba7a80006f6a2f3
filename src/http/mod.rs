//! HTTP request/response adaptation subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1.1, optional inbound staging)
//!     → adapter.rs (bridge id → Event, error translation)
//!     → request.rs (lazy cookies, query, body)
//!     → handler.rs (user code)
//!     → response.rs (send pipeline: headers, etag, HEAD / 204 / 304)
//!     → Send to client
//! ```

pub mod adapter;
pub mod content_type;
pub mod error;
pub mod etag;
pub mod handler;
pub mod lazy;
pub mod request;
pub mod response;
pub mod server;

pub use adapter::RequestAdapter;
pub use error::{AdapterError, ApiError, HandlerError, SendError};
pub use handler::{handler_fn, Handler};
pub use request::Request;
pub use response::{Response, SendBody};
pub use server::LauncherServer;
