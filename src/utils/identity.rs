//! Entity identity
//!
//! Every list entry (post, comment, community, user) is identified by a stable
//! id. Two entries with the same id are the same entity regardless of their
//! payload, which is what de-duplication and optimistic mutations key on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::Hash;

/// Anything that can live in a synchronized list
pub trait Identified {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + 'static;

    fn id(&self) -> Self::Id;
}

/// Server ids are either numeric or opaque strings
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Num(i64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self::Num(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Generic list entry as it comes off the REST backend: an id plus whatever
/// fields the endpoint returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Parse an item from a JSON object; `None` when the id is missing or malformed
    pub fn from_json(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Flip a boolean flag (joined, liked, following...), treating a missing
    /// flag as false. Returns the new value.
    pub fn toggle_bool(&mut self, key: &str) -> bool {
        let next = !self.get_bool(key).unwrap_or(false);
        self.set(key, next);
        next
    }

    /// Adjust a counter field without going below zero
    pub fn bump_count(&mut self, key: &str, delta: i64) -> i64 {
        let next = (self.get_i64(key).unwrap_or(0) + delta).max(0);
        self.set(key, next);
        next
    }
}

impl Identified for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id.clone()
    }
}
