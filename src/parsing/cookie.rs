//! `Cookie` request header decoding.

use std::collections::HashMap;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::{Cookie, ParseError};

/// Cookie name → decoded value.
pub type Cookies = HashMap<String, String>;

/// Decode every `cookie` header of a request.
///
/// Multiple header values are joined with `;` before parsing. A missing
/// header yields an empty map.
pub fn parse_cookies(headers: &HeaderMap) -> Cookies {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(";");

    parse_cookie_str(&joined)
}

/// Decode a raw `name=value; name2=value2` string.
///
/// Pairs without `=` or with an empty name are skipped and the first
/// occurrence of a name wins. Values are unquoted and percent-decoded, and a
/// value whose escapes do not decode to UTF-8 is kept as written.
pub fn parse_cookie_str(input: &str) -> Cookies {
    let mut cookies = Cookies::new();

    for pair in input.split(';') {
        let cookie = match Cookie::parse_encoded(pair) {
            Ok(cookie) => cookie,
            Err(ParseError::Utf8Error(_)) => match Cookie::parse(pair) {
                Ok(cookie) => cookie,
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        if !cookies.contains_key(cookie.name()) {
            cookies.insert(cookie.name().to_string(), cookie.value_trimmed().to_string());
        }
    }

    cookies
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn absent_header_is_empty() {
        assert!(parse_cookies(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn parses_pairs() {
        let cookies = parse_cookie_str("session=abc123; user = john ;flag");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["session"], "abc123");
        assert_eq!(cookies["user"], "john");
    }

    #[test]
    fn unwraps_quotes_and_decodes() {
        let cookies = parse_cookie_str(r#"q="hello%20world"; raw=%E0%A4%A; plus=a+b"#);
        assert_eq!(cookies["q"], "hello world");
        assert_eq!(cookies["raw"], "%E0%A4%A");
        assert_eq!(cookies["plus"], "a+b");
    }

    #[test]
    fn first_occurrence_wins() {
        let cookies = parse_cookie_str("id=1; id=2");
        assert_eq!(cookies["id"], "1");
    }

    #[test]
    fn multiple_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));

        let cookies = parse_cookies(&headers);
        assert_eq!(cookies["a"], "1");
        assert_eq!(cookies["b"], "2");
    }

    #[test]
    fn empty_names_and_blank_segments_are_skipped() {
        let cookies = parse_cookie_str(";; =orphan; ok=1;  ");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies["ok"], "1");
    }

    #[test]
    fn encoded_names_are_decoded() {
        let cookies = parse_cookie_str("my%20key=v");
        assert_eq!(cookies["my key"], "v");
    }

    #[test]
    fn value_may_contain_equals() {
        let cookies = parse_cookie_str("token=a=b=c");
        assert_eq!(cookies["token"], "a=b=c");
    }
}
