//! Fuzzy column-name lookup.
//!
//! SQL engines and saved configurations disagree on casing and underscores
//! (`Total_Sales` vs `totalsales` vs `TOTAL SALES`). Lookups try an ordered
//! list of matchers, strictest first.

use crate::data::Row;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatcher {
    Exact,
    CaseInsensitive,
    /// Lower-cased with whitespace and underscores removed.
    Normalized,
}

/// Matchers in resolution order.
pub const MATCHERS: [KeyMatcher; 3] = [
    KeyMatcher::Exact,
    KeyMatcher::CaseInsensitive,
    KeyMatcher::Normalized,
];

impl KeyMatcher {
    /// Canonical form of a key under this matcher; two keys match when their forms are equal.
    pub fn canonical<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            KeyMatcher::Exact => Cow::Borrowed(key),
            KeyMatcher::CaseInsensitive => Cow::Owned(key.to_lowercase()),
            KeyMatcher::Normalized => Cow::Owned(
                key.chars()
                    .filter(|c| !c.is_whitespace() && *c != '_')
                    .flat_map(char::to_lowercase)
                    .collect(),
            ),
        }
    }
}

/// Resolve a field against a single row by scanning its keys.
pub fn resolve_field_value<'r>(row: &'r Row, field: &str) -> Option<&'r Value> {
    if let Some(value) = row.get(field) {
        return Some(value);
    }
    for matcher in &MATCHERS[1..] {
        let target = matcher.canonical(field);
        if let Some((_, value)) = row.iter().find(|(key, _)| matcher.canonical(key) == target) {
            return Some(value);
        }
    }
    None
}

/// Key index built once per row set.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    // One map per matcher, canonical form -> actual key. First appearance wins.
    indexes: Vec<HashMap<String, String>>,
}

impl FieldResolver {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut indexes = vec![HashMap::new(); MATCHERS.len()];
        for key in keys {
            let key = key.as_ref();
            for (matcher, index) in MATCHERS.iter().zip(indexes.iter_mut()) {
                index
                    .entry(matcher.canonical(key).into_owned())
                    .or_insert_with(|| key.to_string());
            }
        }
        Self { indexes }
    }

    /// Index the declared columns plus every key seen in the rows.
    pub fn from_rows(columns: &[String], rows: &[Row]) -> Self {
        let keys = columns
            .iter()
            .map(String::as_str)
            .chain(rows.iter().flat_map(|row| row.keys().map(String::as_str)));
        Self::new(keys)
    }

    /// The actual key a field name refers to, if any.
    pub fn resolve_key(&self, field: &str) -> Option<&str> {
        for (matcher, index) in MATCHERS.iter().zip(&self.indexes) {
            let canonical = matcher.canonical(field);
            if let Some(key) = index.get(&*canonical) {
                if *matcher != KeyMatcher::Exact {
                    tracing::trace!(field, key = key.as_str(), ?matcher, "resolved field by fuzzy match");
                }
                return Some(key);
            }
        }
        None
    }

    /// Look a field up in one row. Falls back to a per-row scan when the row
    /// does not carry the indexed key.
    pub fn value<'r>(&self, row: &'r Row, field: &str) -> Option<&'r Value> {
        self.resolve_key(field)
            .and_then(|key| row.get(key))
            .or_else(|| resolve_field_value(row, field))
    }
}
