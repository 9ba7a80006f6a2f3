//! Bridge events and their identifiers.

use std::fmt;
use std::str::FromStr;

use axum::http::HeaderName;
use bytes::Bytes;

use crate::bridge::BridgeError;

/// Header carrying the bridge request id. Consumed before handlers run.
pub static X_NOW_BRIDGE_REQUEST_ID: HeaderName = HeaderName::from_static("x-now-bridge-request-id");

/// Single-use identifier of a staged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BridgeError::InvalidRequestId(s.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| BridgeError::InvalidRequestId(s.to_string()))
    }
}

/// The raw body of exactly one pending request.
#[derive(Debug, Clone, Default)]
pub struct Event {
    body: Bytes,
}

impl Event {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_ids() {
        assert_eq!("42".parse::<RequestId>().unwrap(), RequestId::new(42));
        assert_eq!(" 7 ".parse::<RequestId>().unwrap().as_u64(), 7);
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "abc", "-1", "+1", "1.5", "99999999999999999999999"] {
            assert!(
                matches!(raw.parse::<RequestId>(), Err(BridgeError::InvalidRequestId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        let id = RequestId::new(1234);
        assert_eq!(id.to_string().parse::<RequestId>().unwrap(), id);
    }
}
