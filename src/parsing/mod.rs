//! Request input decoding.
//!
//! # Data Flow
//! ```text
//! headers["cookie"]        → cookie.rs → Cookies
//! uri (path + query)       → query.rs  → Query
//! body bytes + content-type → body.rs  → ParsedBody
//!                                 └─ form bodies → form.rs (bracket expansion)
//! ```
//!
//! # Design Decisions
//! - All decoders are synchronous and pure; `http::request` runs them lazily
//! - Only body decoding can fail, and only with a client error
//! - Bracket expansion applies to form bodies, never to query strings

pub mod body;
pub mod cookie;
pub mod form;
pub mod query;

pub use body::{parse_body, ParsedBody};
pub use cookie::{parse_cookies, Cookies};
pub use form::{decode_form, FormData, FormValue};
pub use query::{parse_query, Query};
