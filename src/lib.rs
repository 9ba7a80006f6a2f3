//! Request bridge library.
//!
//! Adapts raw inbound HTTP requests into handler-friendly request and
//! response objects, exchanging a single-use bridge id for the request body.

pub mod admin;
pub mod bridge;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod parsing;

pub use bridge::{Bridge, EventStore};
pub use config::LauncherConfig;
pub use http::{handler_fn, Handler, LauncherServer, Request, RequestAdapter, Response};
pub use lifecycle::Shutdown;
