//! Attribute values
//!
//! Attributes are dynamically typed: component types declare them by name
//! and configs or callers write them at runtime.

use fos_dom::NodeId;
use indexmap::IndexMap;

use crate::EventMap;

/// Dynamically typed attribute value
#[derive(Debug, Clone, Default)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Node(NodeId),
    Events(EventMap),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_events(&self) -> Option<&EventMap> {
        match self {
            Self::Events(e) => Some(e),
            _ => None,
        }
    }

    /// Class tokens of a string (`"a b"`) or list (`["a", "b"]`) value
    pub fn class_tokens(&self) -> Vec<String> {
        match self {
            Self::Str(s) => s.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items.iter().flat_map(Self::class_tokens).collect(),
            _ => Vec::new(),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Events(a), Self::Events(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NodeId> for AttrValue {
    fn from(v: NodeId) -> Self {
        Self::Node(v)
    }
}

impl From<EventMap> for AttrValue {
    fn from(v: EventMap) -> Self {
        Self::Events(v)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One coalesced attribute change
#[derive(Debug, Clone, PartialEq)]
pub struct AttrChange {
    pub prev_val: AttrValue,
    pub new_val: AttrValue,
}

/// Changed attributes of one batch, in first-write order
pub type AttrChanges = IndexMap<String, AttrChange>;

/// Ordered attribute name → value pairs used to configure a component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: IndexMap<String, AttrValue>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.values.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries of `other` win over entries of `self`
    #[must_use]
    pub fn merged(mut self, other: Config) -> Self {
        self.values.extend(other.values);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Config {
    type Item = (String, AttrValue);
    type IntoIter = indexmap::map::IntoIter<String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
