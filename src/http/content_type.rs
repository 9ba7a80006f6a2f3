//! `Content-Type` parsing and formatting.
//!
//! ```text
//! media-type = type "/" subtype *( OWS ";" OWS parameter )
//! parameter  = token "=" ( token / quoted-string )
//! ```
//!
//! Type, subtype and parameter names are case-insensitive and normalized to
//! lowercase. Parameters are formatted in name order.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Errors produced while parsing a `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentTypeError {
    #[error("empty content type")]
    Empty,
    #[error("invalid media type")]
    InvalidMediaType,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    media_type: String,
    subtype: String,
    parameters: BTreeMap<String, String>,
}

impl ContentType {
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentTypeError::Empty);
        }

        let (essence, rest) = match input.find(';') {
            Some(pos) => (input[..pos].trim(), &input[pos + 1..]),
            None => (input, ""),
        };

        let (media_type, subtype) = essence
            .split_once('/')
            .map(|(t, s)| (t.trim(), s.trim()))
            .ok_or(ContentTypeError::InvalidMediaType)?;
        if !is_token(media_type) || !is_token(subtype) {
            return Err(ContentTypeError::InvalidMediaType);
        }

        Ok(Self {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: parse_parameters(rest)?,
        })
    }

    /// `type/subtype` without parameters, e.g. `application/json`.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Insert or replace a parameter.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>) {
        self.parameters
            .insert(name.to_ascii_lowercase(), value.into());
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        for (name, value) in &self.parameters {
            if is_token(value) {
                write!(f, "; {}={}", name, value)?;
            } else {
                write!(
                    f,
                    "; {}=\"{}\"",
                    name,
                    value.replace('\\', "\\\\").replace('"', "\\\"")
                )?;
            }
        }
        Ok(())
    }
}

/// MIME essence of a raw header value, or `None` if it does not parse.
pub fn essence_of(raw: &str) -> Option<String> {
    ContentType::parse(raw).ok().map(|ct| ct.essence())
}

fn parse_parameters(input: &str) -> Result<BTreeMap<String, String>, ContentTypeError> {
    let mut parameters = BTreeMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        rest = rest.trim_start_matches(';').trim_start();
        if rest.is_empty() {
            break;
        }

        let eq = rest.find('=').ok_or(ContentTypeError::InvalidParameter)?;
        let name = rest[..eq].trim();
        if !is_token(name) {
            return Err(ContentTypeError::InvalidParameter);
        }
        rest = rest[eq + 1..].trim_start();

        let (value, remaining) = match rest.strip_prefix('"') {
            Some(quoted) => parse_quoted(quoted)?,
            None => {
                let end = rest.find(';').unwrap_or(rest.len());
                (rest[..end].trim().to_string(), &rest[end..])
            }
        };

        parameters.insert(name.to_ascii_lowercase(), value);
        rest = remaining.trim_start();
    }

    Ok(parameters)
}

fn parse_quoted(input: &str) -> Result<(String, &str), ContentTypeError> {
    let mut value = String::new();
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => {
                value.push(c);
                escaped = false;
            }
            '\\' => escaped = true,
            '"' => return Ok((value, &input[i + 1..])),
            _ => value.push(c),
        }
    }

    Err(ContentTypeError::UnterminatedQuote)
}

// RFC 9110 tchar
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            matches!(b,
                b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
                b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_essence_case_insensitively() {
        let ct = ContentType::parse("Application/JSON; Charset=UTF-8").unwrap();
        assert_eq!(ct.essence(), "application/json");
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn parses_quoted_parameters() {
        let ct = ContentType::parse(r#"multipart/form-data; boundary="a \"b\" c""#).unwrap();
        assert_eq!(ct.parameter("boundary"), Some(r#"a "b" c"#));
    }

    #[test]
    fn rejects_malformed_values() {
        assert_eq!(ContentType::parse(""), Err(ContentTypeError::Empty));
        assert_eq!(
            ContentType::parse("text"),
            Err(ContentTypeError::InvalidMediaType)
        );
        assert_eq!(
            ContentType::parse("text/plain; charset"),
            Err(ContentTypeError::InvalidParameter)
        );
        assert_eq!(
            ContentType::parse("text/plain; a=\"open"),
            Err(ContentTypeError::UnterminatedQuote)
        );
    }

    #[test]
    fn charset_replacement_keeps_other_parameters_sorted() {
        let mut ct = ContentType::parse("text/HTML; level=1; charset=latin1").unwrap();
        ct.set_parameter("charset", "utf-8");
        assert_eq!(ct.to_string(), "text/html; charset=utf-8; level=1");
    }

    #[test]
    fn formats_values_needing_quotes() {
        let mut ct = ContentType::parse("text/plain").unwrap();
        ct.set_parameter("title", "a b");
        assert_eq!(ct.to_string(), "text/plain; title=\"a b\"");
    }

    #[test]
    fn essence_of_unparseable_is_none() {
        assert_eq!(essence_of("text/plain;charset=utf-8").as_deref(), Some("text/plain"));
        assert_eq!(essence_of("not a type"), None);
    }
}
