//! Query string decoding.

use std::collections::HashMap;

use axum::http::Uri;
use url::Url;

/// Query parameter name → decoded value.
pub type Query = HashMap<String, String>;

// Placeholder origin; only the query component of the joined URL is used.
const PLACEHOLDER_BASE: &str = "http://n";

/// Decode the query component of a request target.
///
/// Repeated keys keep the last value. Bracket suffixes are not interpreted
/// here.
pub fn parse_query(uri: &Uri) -> Query {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("/");

    let url = match Url::parse(PLACEHOLDER_BASE).and_then(|base| base.join(target)) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(target = %target, error = %e, "Unresolvable request target");
            return Query::new();
        }
    };

    url.query_pairs().into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(target: &str) -> Query {
        parse_query(&target.parse::<Uri>().unwrap())
    }

    #[test]
    fn no_query_is_empty() {
        assert!(query("/").is_empty());
        assert!(query("/path").is_empty());
    }

    #[test]
    fn decodes_pairs() {
        let q = query("/search?q=hello+world&lang=en%2Dus&empty=");
        assert_eq!(q["q"], "hello world");
        assert_eq!(q["lang"], "en-us");
        assert_eq!(q["empty"], "");
    }

    #[test]
    fn last_value_wins() {
        let q = query("/?a=1&a=2&a=3");
        assert_eq!(q["a"], "3");
    }

    #[test]
    fn brackets_are_literal() {
        let q = query("/?list[]=1&list[]=2");
        assert_eq!(q.len(), 1);
        assert_eq!(q["list[]"], "2");
    }

    #[test]
    fn absolute_form_targets_use_their_query() {
        let q = query("http://example.com/x?k=v");
        assert_eq!(q["k"], "v");
    }
}
