//! Handler-facing request.
//!
//! # Responsibilities
//! - Expose method, target and headers (bridge request id already removed)
//! - Decode cookies, query and body lazily, at most once each
//! - Allow handlers and tests to override any decoded value
//!
//! # Design Decisions
//! - Each lazy property captures clones of this request's own headers,
//!   target and body; nothing is shared with other requests
//! - Body decoding failures are cached too, so a malformed JSON body fails
//!   the same way on every read

use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri, Version};
use bytes::Bytes;

use crate::bridge::RequestId;
use crate::http::error::ApiError;
use crate::http::lazy::LazyProperty;
use crate::parsing::{parse_body, parse_cookies, parse_query, Cookies, ParsedBody, Query};

type BodyResult = Result<Option<ParsedBody>, ApiError>;

/// An inbound request augmented with lazily decoded inputs.
pub struct Request {
    id: RequestId,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    raw_body: Bytes,
    cookies: LazyProperty<Cookies>,
    query: LazyProperty<Query>,
    body: LazyProperty<BodyResult>,
}

impl Request {
    /// Build a request from its head and the body vended by the bridge.
    ///
    /// `parts.headers` must already be stripped of the bridge request id.
    pub fn new(id: RequestId, parts: Parts, raw_body: Bytes) -> Self {
        let Parts {
            method,
            uri,
            version,
            headers,
            ..
        } = parts;

        let cookie_headers = headers.clone();
        let cookies = LazyProperty::new(move || parse_cookies(&cookie_headers));

        let target = uri.clone();
        let query = LazyProperty::new(move || parse_query(&target));

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body_bytes = raw_body.clone();
        let body = LazyProperty::new(move || parse_body(content_type.as_deref(), &body_bytes));

        Self {
            id,
            method,
            uri,
            version,
            headers,
            raw_body,
            cookies,
            query,
            body,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes exactly as received.
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Decoded `cookie` header. Empty when absent.
    pub fn cookies(&self) -> &Cookies {
        self.cookies.get()
    }

    pub fn set_cookies(&mut self, cookies: Cookies) {
        self.cookies.set(cookies);
    }

    /// Decoded query string. Last value wins for repeated keys.
    pub fn query(&self) -> &Query {
        self.query.get()
    }

    pub fn set_query(&mut self, query: Query) {
        self.query.set(query);
    }

    /// Decoded body, `None` for absent or unsupported content types.
    ///
    /// Fails with 400 "Invalid JSON" for a malformed JSON body; propagate it
    /// with `?` to answer the request with that status.
    pub fn body(&self) -> Result<Option<&ParsedBody>, ApiError> {
        match self.body.get() {
            Ok(body) => Ok(body.as_ref()),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn set_body(&mut self, body: Option<ParsedBody>) {
        self.body.set(Ok(body));
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}
