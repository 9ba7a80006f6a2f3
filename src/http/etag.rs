//! Weak entity-tag generation.
//!
//! Format: `W/"<length in hex>-<first 27 chars of base64(SHA-1)>"`, the weak
//! validator produced by the common `etag` algorithm for in-memory bodies.
//! The value only depends on the bytes, so identical content always yields
//! the same tag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

const HASH_LEN: usize = 27;

/// Compute a weak ETag for a response body.
pub fn weak_etag(body: &[u8]) -> String {
    let digest = STANDARD.encode(Sha1::digest(body));
    format!("W/\"{:x}-{}\"", body.len(), &digest[..HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body() {
        assert_eq!(weak_etag(b""), "W/\"0-2jmj7l5rSw0yVb/vlWAYkK/YBwk\"");
    }

    #[test]
    fn length_is_hex() {
        let body = vec![b'a'; 255];
        assert!(weak_etag(&body).starts_with("W/\"ff-"));
    }

    #[test]
    fn known_digests() {
        assert_eq!(
            weak_etag(b"hello world"),
            "W/\"b-Kq5sNclPz7QV2+lfQIuc6R7oRu0\""
        );
        assert_eq!(weak_etag(b"ok"), "W/\"2-eoX0dku9ba8cNUXvu/DyeabcC+s\"");
    }

    #[test]
    fn deterministic_for_identical_content() {
        assert_eq!(weak_etag(b"hello world"), weak_etag(b"hello world"));
        assert_ne!(weak_etag(b"hello world"), weak_etag(b"hello world!"));
    }
}
