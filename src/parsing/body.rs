//! Request body decoding, dispatched on the `Content-Type` essence.

use bytes::Bytes;
use url::form_urlencoded;

use crate::http::content_type;
use crate::http::error::ApiError;
use crate::parsing::form::{decode_form, FormData};

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/json`
    Json(serde_json::Value),
    /// `application/octet-stream`, passed through unchanged.
    Bytes(Bytes),
    /// `application/x-www-form-urlencoded`
    Form(FormData),
    /// `text/plain`
    Text(String),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ParsedBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            ParsedBody::Form(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedBody::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ParsedBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Decode `raw` according to `content_type`.
///
/// Returns `Ok(None)` when the header is absent, unparseable, or names a type
/// without a decoder. Malformed JSON is a client error.
pub fn parse_body(content_type: Option<&str>, raw: &Bytes) -> Result<Option<ParsedBody>, ApiError> {
    let Some(essence) = content_type.and_then(content_type::essence_of) else {
        return Ok(None);
    };

    let parsed = match essence.as_str() {
        "application/json" => match serde_json::from_slice(raw) {
            Ok(value) => ParsedBody::Json(value),
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting malformed JSON body");
                return Err(ApiError::bad_request("Invalid JSON"));
            }
        },
        "application/octet-stream" => ParsedBody::Bytes(raw.clone()),
        "application/x-www-form-urlencoded" => {
            ParsedBody::Form(decode_form(form_urlencoded::parse(raw)))
        }
        "text/plain" => ParsedBody::Text(String::from_utf8_lossy(raw).into_owned()),
        _ => return Ok(None),
    };

    Ok(Some(parsed))
}
