#![forbid(unsafe_code)]

//! The schema-less state value.
//!
//! [`Value`] is the only shape the dispatch core understands: a JSON-shaped
//! tagged union with insertion-ordered maps. Path reads return `None` on any
//! shape mismatch; path writes materialize missing containers along the way
//! (create-on-write) and fail fast on genuine shape conflicts.

use crate::error::PathError;
use crate::path::{Path, Seg};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON-shaped, schema-less state value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The null value. Also what an absent scoped subtree reads as.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Insertion-ordered map.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Short name of this value's shape, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// True if this is `Value::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as a bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Read the subtree a path points at.
    ///
    /// Returns `None` if any segment is missing or applied to a value of the
    /// wrong shape. The empty path returns `self`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut cursor = self;
        for seg in path.segments() {
            cursor = match (cursor, seg) {
                (Value::Map(entries), Seg::Key(k)) => entries.get(k)?,
                (Value::List(items), Seg::Index(i)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(cursor)
    }

    /// Replace the subtree a path points at, creating missing containers.
    ///
    /// A missing key segment materializes a map entry; an index segment equal
    /// to the list length appends. `Null` values along the path are promoted
    /// to the container shape the next segment needs. Indexing past the end
    /// of a list or traversing a scalar of the wrong shape is a [`PathError`].
    pub fn set(&mut self, path: &Path, value: Value) -> Result<(), PathError> {
        let mut cursor: &mut Value = self;
        let mut walked = Path::root();
        for seg in path.segments() {
            // Promote null slots to the container the segment needs.
            if cursor.is_null() {
                *cursor = match seg {
                    Seg::Key(_) => Value::Map(IndexMap::new()),
                    Seg::Index(_) => Value::List(Vec::new()),
                };
            }
            cursor = match (cursor, seg) {
                (Value::Map(entries), Seg::Key(k)) => {
                    entries.entry(k.clone()).or_insert(Value::Null)
                }
                (Value::List(items), Seg::Index(i)) => {
                    if *i > items.len() {
                        return Err(PathError::IndexOutOfBounds {
                            at: walked,
                            index: *i,
                            len: items.len(),
                        });
                    }
                    if *i == items.len() {
                        items.push(Value::Null);
                    }
                    &mut items[*i]
                }
                (other, seg) => {
                    return Err(PathError::TypeMismatch {
                        at: walked,
                        segment: seg.clone(),
                        found: other.kind(),
                    });
                }
            };
            walked.push(seg.clone());
        }
        *cursor = value;
        Ok(())
    }

    /// Remove and return the subtree a path points at.
    ///
    /// Map entries and list elements are removed from their container. Like
    /// [`get`](Self::get), any missing or shape-mismatched segment yields
    /// `None`. Taking the root leaves `Null` behind.
    pub fn take(&mut self, path: &Path) -> Option<Value> {
        let Some((last, prefix)) = path.as_slice().split_last() else {
            return Some(std::mem::take(self));
        };
        let mut cursor = self;
        for seg in prefix {
            cursor = match (cursor, seg) {
                (Value::Map(entries), Seg::Key(k)) => entries.get_mut(k)?,
                (Value::List(items), Seg::Index(i)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        match (cursor, last) {
            (Value::Map(entries), Seg::Key(k)) => entries.shift_remove(k),
            (Value::List(items), Seg::Index(i)) if *i < items.len() => Some(items.remove(*i)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.clone());
        write!(f, "{json}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            // Integers beyond f64 precision degrade; state numbers are f64.
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Build a map value from key/value pairs.
#[must_use]
pub fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect(),
    )
}

/// Build a list value from elements.
#[must_use]
pub fn list<const N: usize>(items: [Value; N]) -> Value {
    Value::List(items.into())
}
