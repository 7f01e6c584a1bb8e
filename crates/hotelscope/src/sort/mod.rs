//! Stable multi-key sorting over record-like values.
//!
//! Keys are field names, optionally prefixed with `-` for descending order:
//!
//! ```rust
//! use hotelscope::sort::{SortKey, multi_key_sort};
//! use serde_json::json;
//!
//! let records = vec![json!({"a": 2, "b": 0}), json!({"a": 1, "b": 1}), json!({"a": 1, "b": 2})];
//! let sorted = multi_key_sort(records, &SortKey::parse_all(["a", "-b"]));
//! assert_eq!(sorted[0], json!({"a": 1, "b": 2}));
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

const DESCENDING_PREFIX: char = '-';

/// One sort key: a field name and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses `"field"` or `"-field"`. Empty names yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let (field, descending) = key
            .strip_prefix(DESCENDING_PREFIX)
            .map_or((key, false), |field| (field, true));
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_owned(),
            descending,
        })
    }

    pub fn parse_all<I, S>(keys: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .filter_map(|key| Self::parse(key.as_ref()))
            .collect()
    }
}

/// A comparable value extracted from a record.
///
/// Values of different kinds compare by kind, in declaration order. Missing values
/// are represented by `Option::None` at the call site and sort below everything.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SortValue {
    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Date(_) => 3,
            Self::Timestamp(_) => 4,
        }
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for SortValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<NaiveDate> for SortValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for SortValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Key extraction for the sort composer.
pub trait SortFields {
    /// The value of `field`, or `None` when the record has no such value.
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

impl<T: SortFields + ?Sized> SortFields for &T {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        (**self).sort_value(field)
    }
}

impl SortFields for Map<String, Value> {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        self.get(field).and_then(json_sort_value)
    }
}

impl SortFields for Value {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        self.as_object().and_then(|map| map.sort_value(field))
    }
}

fn json_sort_value(value: &Value) -> Option<SortValue> {
    match value {
        Value::Bool(b) => Some(SortValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(SortValue::Number),
        Value::String(s) => Some(SortValue::Text(s.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Compares two records key by key; the first non-equal key decides.
pub fn compare_by_keys<T: SortFields + ?Sized>(a: &T, b: &T, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = a.sort_value(&key.field).cmp(&b.sort_value(&key.field));
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable sort by the composite key, each key with its own direction.
pub fn multi_key_sort<T: SortFields>(mut records: Vec<T>, keys: &[SortKey]) -> Vec<T> {
    if keys.is_empty() || records.len() < 2 {
        return records;
    }
    records.sort_by(|a, b| compare_by_keys(a, b, keys));
    records
}
