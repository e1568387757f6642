//! The schema-less tree every front-end produces.
//!
//! A [`GenericNode`] maps sanitized member names to [`Value`]s and may carry
//! a *self-scalar*: the raw text of the element/primitive it was built from.
//! Pure containers have no self-scalar, so `as_str()` on them is `None`;
//! callers use that to tell branches from leaves.
pub mod convert;
pub mod path;

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{Result, SlurperError};

pub use convert::{ConversionError, ScalarText, TargetType};
pub use path::PathRef;

/// Member name exposing the elements of an anonymous (root-level) array.
pub const ITEMS_MEMBER: &str = "items";
/// Compatibility alias for [`ITEMS_MEMBER`].
pub const LIST_ALIAS_MEMBER: &str = "List";

/// Key used for the self-scalar when a mixed node is serialized.
const TEXT_KEY: &str = "#text";

// ------------------------------- Scalars ---------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    DateTime(NaiveDateTime),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Long(n) => write!(f, "{n}"),
            Scalar::Double(x) => write!(f, "{x}"),
            Scalar::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::Text(s.to_string()) }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self { Scalar::Text(s) }
}

// -------------------------------- Values ---------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Node(GenericNode),
    List(Vec<GenericNode>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self { Value::Scalar(Scalar::Text(s.into())) }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_node(&self) -> Option<&GenericNode> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GenericNode]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Index into a list value, or into a node that wraps one.
    pub fn index(&self, index: usize) -> Result<&GenericNode> {
        match self {
            Value::List(items) => items.get(index).ok_or_else(|| out_of_range(index, items.len())),
            Value::Node(node) => node.index(index),
            Value::Null => Err(not_a_list(index, "value is null")),
            Value::Scalar(_) => Err(not_a_list(index, "value is a scalar")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::List(_) => Ok(()),
            Value::Scalar(s) => s.fmt(f),
            Value::Node(node) => node.fmt(f),
        }
    }
}

// ------------------------------ GenericNode ------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenericNode {
    members: IndexMap<String, Value>,
    scalar: Option<String>,
}

impl GenericNode {
    pub fn new() -> Self { Self::default() }

    /// A node whose only content is its self-scalar.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self { members: IndexMap::new(), scalar: Some(text.into()) }
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.members.get(name) }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> { self.members.get_mut(name) }

    pub fn contains(&self, name: &str) -> bool { self.members.contains_key(name) }

    /// Insert or replace a member, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.members.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> { self.members.shift_remove(name) }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.members.keys().map(String::as_str) }

    pub fn len(&self) -> usize { self.members.len() }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// The self-scalar; `None` for pure containers.
    pub fn as_str(&self) -> Option<&str> { self.scalar.as_deref() }

    pub fn set_scalar(&mut self, text: Option<String>) { self.scalar = text; }

    pub fn is_leaf(&self) -> bool { self.members.is_empty() }

    pub fn is_container(&self) -> bool { self.scalar.is_none() && !self.members.is_empty() }

    /// Child node stored under `name`, if that member is a nested object.
    pub fn node(&self, name: &str) -> Option<&GenericNode> { self.get(name).and_then(Value::as_node) }

    /// Sequence stored under `name`, if that member is a list.
    pub fn list(&self, name: &str) -> Option<&[GenericNode]> { self.get(name).and_then(Value::as_list) }

    /// Positional access for nodes built from an anonymous array.
    ///
    /// Reads the `items` member, or the single member of a node whose only
    /// member is a list. Anything else is an indexing error.
    pub fn index(&self, index: usize) -> Result<&GenericNode> {
        let items = match self.list(ITEMS_MEMBER) {
            Some(items) => items,
            None => {
                let mut values = self.members.values();
                match (values.next(), values.next()) {
                    (Some(Value::List(items)), None) => items.as_slice(),
                    _ => return Err(not_a_list(index, "node does not hold a sequence")),
                }
            }
        };
        items.get(index).ok_or_else(|| out_of_range(index, items.len()))
    }
}

impl fmt::Display for GenericNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scalar {
            Some(s) => f.write_str(s),
            None => Ok(()),
        }
    }
}

fn not_a_list(index: usize, reason: &str) -> SlurperError {
    SlurperError::Indexing { index, reason: reason.to_string() }
}

fn out_of_range(index: usize, len: usize) -> SlurperError {
    SlurperError::Indexing { index, reason: format!("sequence has {len} element(s)") }
}

// ------------------------------ Serialization ----------------------------- //

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(n) => serializer.serialize_i32(*n),
            Scalar::Long(n) => serializer.serialize_i64(*n),
            Scalar::Double(x) => serializer.serialize_f64(*x),
            Scalar::DateTime(_) => serializer.collect_str(self),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Scalar(s) => s.serialize(serializer),
            Value::Node(node) => node.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for GenericNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.members.is_empty() {
            return match &self.scalar {
                Some(s) => serializer.serialize_str(s),
                None => serializer.serialize_unit(),
            };
        }
        let extra = usize::from(self.scalar.is_some());
        let mut map = serializer.serialize_map(Some(self.members.len() + extra))?;
        for (name, value) in &self.members {
            map.serialize_entry(name, value)?;
        }
        if let Some(s) = &self.scalar {
            map.serialize_entry(TEXT_KEY, s)?;
        }
        map.end()
    }
}

// ------------------------------- Tests ------------------------------------ //
