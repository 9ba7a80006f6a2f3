//! Bracket-notation expansion for form bodies.
//!
//! # Rules
//! - `name=v` and named brackets such as `obj[field]=v` are stored verbatim
//!   under the full key
//! - `name[]=v` appends to the list stored under `name`
//! - `name[N]=v` stores `v` at index `N` of the list under `name`, leaving
//!   holes for skipped indices
//! - a scalar already stored under `name` becomes the first list element
//! - indices above [`MAX_LIST_INDEX`] are stored verbatim like named brackets
//!
//! Nested objects are not built from named brackets.

use std::collections::HashMap;

use serde::Serialize;

/// A decoded form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    /// `None` marks an index that was never assigned.
    List(Vec<Option<String>>),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<String>]> {
        match self {
            FormValue::List(items) => Some(items),
            FormValue::Text(_) => None,
        }
    }
}

/// Decoded form body.
pub type FormData = HashMap<String, FormValue>;

/// Largest index honoured by `name[N]`; larger indices are kept verbatim.
pub const MAX_LIST_INDEX: usize = 1024;

/// How the trailing bracket of a key addresses the list.
enum Slot {
    Append,
    Index(usize),
}

/// Expand encounter-ordered, already decoded pairs into form data.
pub fn decode_form<I, K, V>(pairs: I) -> FormData
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut form = FormData::new();

    for (key, value) in pairs {
        let key = key.as_ref();
        let value = value.into();

        let Some((base, digits)) = split_index_suffix(key) else {
            form.insert(key.to_string(), FormValue::Text(value));
            continue;
        };

        let slot = if has_short_bracket(key) {
            Slot::Append
        } else {
            match digits.parse::<usize>() {
                Ok(index) if index <= MAX_LIST_INDEX => Slot::Index(index),
                // Index too large to address; keep the field under its raw name.
                _ => {
                    form.insert(key.to_string(), FormValue::Text(value));
                    continue;
                }
            }
        };

        let mut items = match form.remove(base) {
            Some(FormValue::List(items)) => items,
            Some(FormValue::Text(existing)) => vec![Some(existing)],
            None => Vec::new(),
        };

        match slot {
            Slot::Append => items.push(Some(value)),
            Slot::Index(index) => {
                if items.len() <= index {
                    items.resize(index + 1, None);
                }
                items[index] = Some(value);
            }
        }
        form.insert(base.to_string(), FormValue::List(items));
    }

    form
}

/// Split `base[digits]` into `(base, digits)`; `digits` may be empty.
fn split_index_suffix(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let digits = &inner[open + 1..];
    digits
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| (&key[..open], digits))
}

/// Whether the key contains `[]` or a bracket around exactly one non-digit.
fn has_short_bracket(key: &str) -> bool {
    key.match_indices('[').any(|(i, _)| {
        let mut rest = key[i + 1..].chars();
        match rest.next() {
            Some(']') => true,
            Some(c) if !c.is_ascii_digit() => rest.next() == Some(']'),
            _ => false,
        }
    })
}
