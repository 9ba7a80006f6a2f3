//! Handler-facing response and the send pipeline.
//!
//! # Pipeline (`send`)
//! ```text
//! Structured ─────────────────────────────→ json() → send(Text)
//! Empty / null → Text("")
//! Text / Bytes
//!     → default content-type (text/html | application/octet-stream)
//!     → text: declare charset=utf-8
//!     → content-length (long text materialized as bytes first)
//!     → weak etag, unless already set
//!     → 204 / 304: strip entity headers, drop body
//!     → HEAD: drop body
//!     → finished
//! ```
//!
//! # Design Decisions
//! - The body shape is a closed enum, so there is no "unknown shape" path
//! - A finished response rejects further sends instead of ignoring them

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use http_body_util::Full;
use hyper::ext::ReasonPhrase;
use serde::Serialize;

use crate::http::content_type::ContentType;
use crate::http::error::{ApiError, SendError};
use crate::http::etag::weak_etag;

/// Text bodies with fewer characters than this are measured in place;
/// longer ones are materialized as bytes first.
pub const SHORT_BODY_CHARS: usize = 1000;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A value handed to [`Response::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum SendBody {
    Text(String),
    Bytes(Bytes),
    /// Routed through [`Response::json`].
    Structured(serde_json::Value),
    /// Sent as an empty text body. `null` values land here too.
    Empty,
}

impl From<String> for SendBody {
    fn from(s: String) -> Self {
        SendBody::Text(s)
    }
}

impl From<&str> for SendBody {
    fn from(s: &str) -> Self {
        SendBody::Text(s.to_string())
    }
}

impl From<Bytes> for SendBody {
    fn from(b: Bytes) -> Self {
        SendBody::Bytes(b)
    }
}

impl From<Vec<u8>> for SendBody {
    fn from(b: Vec<u8>) -> Self {
        SendBody::Bytes(Bytes::from(b))
    }
}

impl From<&'static [u8]> for SendBody {
    fn from(b: &'static [u8]) -> Self {
        SendBody::Bytes(Bytes::from_static(b))
    }
}

impl From<serde_json::Value> for SendBody {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => SendBody::Empty,
            v => SendBody::Structured(v),
        }
    }
}

impl From<()> for SendBody {
    fn from(_: ()) -> Self {
        SendBody::Empty
    }
}

impl<T: Into<SendBody>> From<Option<T>> for SendBody {
    fn from(v: Option<T>) -> Self {
        v.map_or(SendBody::Empty, Into::into)
    }
}

macro_rules! structured_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SendBody {
                fn from(v: $t) -> Self {
                    SendBody::Structured(serde_json::Value::from(v))
                }
            }
        )*
    };
}

structured_from!(bool, i32, i64, u32, u64, f64);

/// Body after shape dispatch.
enum Chunk {
    Text(String),
    Bytes(Bytes),
}

impl Chunk {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Chunk::Text(s) => s.as_bytes(),
            Chunk::Bytes(b) => b,
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            Chunk::Text(s) => Bytes::from(s),
            Chunk::Bytes(b) => b,
        }
    }
}

/// The response a handler writes to.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    status_message: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    finished: bool,
    head: bool,
}

impl Response {
    /// Create an unsent 200 response for a request with `method`.
    pub fn new(method: &Method) -> Self {
        Self {
            status: StatusCode::OK,
            status_message: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            finished: false,
            head: method == Method::HEAD,
        }
    }

    /// A finished, bodiless response rendering `err`.
    pub fn from_api_error(method: &Method, err: &ApiError) -> Self {
        let mut res = Self::new(method);
        res.status = err.status();
        res.status_message = Some(err.message().to_owned());
        res.finished = true;
        res
    }

    /// Set the status code.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set the reason phrase written on the status line.
    pub fn set_status_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a header, replacing existing values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Body as it will be written.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Finish without a body and without touching headers.
    pub fn end(&mut self) -> Result<(), SendError> {
        self.ensure_open()?;
        self.body = Bytes::new();
        self.finished = true;
        Ok(())
    }

    /// Send a body and finish the response.
    pub fn send(&mut self, body: impl Into<SendBody>) -> Result<(), SendError> {
        self.ensure_open()?;

        let chunk = match body.into() {
            SendBody::Empty | SendBody::Structured(serde_json::Value::Null) => {
                Chunk::Text(String::new())
            }
            SendBody::Structured(value) => return self.json(&value),
            SendBody::Text(s) => Chunk::Text(s),
            SendBody::Bytes(b) => Chunk::Bytes(b),
        };

        if !self.headers.contains_key(CONTENT_TYPE) {
            let default = match chunk {
                Chunk::Text(_) => "text/html",
                Chunk::Bytes(_) => "application/octet-stream",
            };
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(default));
        }

        if let Chunk::Text(_) = chunk {
            self.declare_utf8();
        }

        let chunk = match chunk {
            Chunk::Text(s) if is_short(&s) => Chunk::Text(s),
            Chunk::Text(s) => Chunk::Bytes(Bytes::from(s)),
            bytes => bytes,
        };
        self.headers
            .insert(CONTENT_LENGTH, HeaderValue::from(chunk.as_bytes().len()));

        if !self.headers.contains_key(ETAG) {
            match HeaderValue::try_from(weak_etag(chunk.as_bytes())) {
                Ok(tag) => {
                    self.headers.insert(ETAG, tag);
                }
                Err(e) => tracing::debug!(error = %e, "Skipping unrepresentable etag"),
            }
        }

        let chunk = if matches!(self.status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED) {
            self.headers.remove(CONTENT_TYPE);
            self.headers.remove(CONTENT_LENGTH);
            self.headers.remove(TRANSFER_ENCODING);
            Chunk::Text(String::new())
        } else {
            chunk
        };

        self.body = if self.head {
            Bytes::new()
        } else {
            chunk.into_bytes()
        };
        self.finished = true;
        Ok(())
    }

    /// Serialize `value` as JSON and send it.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SendError> {
        self.ensure_open()?;

        let text = serde_json::to_string(value)?;
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        self.send(SendBody::Text(text))
    }

    /// Convert into a hyper response.
    pub fn into_http(self) -> axum::http::Response<Full<Bytes>> {
        let mut response = axum::http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;

        if let Some(message) = self.status_message {
            match ReasonPhrase::try_from(message.into_bytes()) {
                Ok(reason) => {
                    response.extensions_mut().insert(reason);
                }
                Err(e) => tracing::debug!(error = %e, "Dropping invalid status message"),
            }
        }

        response
    }

    fn ensure_open(&self) -> Result<(), SendError> {
        if self.finished {
            Err(SendError::Finished)
        } else {
            Ok(())
        }
    }

    // Rewrites the content-type to carry charset=utf-8. Values that do not
    // parse are left as they are.
    fn declare_utf8(&mut self) {
        let Some(raw) = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
        else {
            return;
        };

        match ContentType::parse(&raw) {
            Ok(mut ct) => {
                ct.set_parameter("charset", "utf-8");
                match HeaderValue::try_from(ct.to_string()) {
                    Ok(value) => {
                        self.headers.insert(CONTENT_TYPE, value);
                    }
                    Err(e) => tracing::debug!(error = %e, "Keeping original content-type"),
                }
            }
            Err(e) => tracing::debug!(content_type = %raw, error = %e, "Unparseable content-type"),
        }
    }
}

fn is_short(s: &str) -> bool {
    s.chars().nth(SHORT_BODY_CHARS - 1).is_none()
}
