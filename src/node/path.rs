//! Dotted-path navigation: `catalog.bookList[0].author`.
//!
//! A thin layer over `get` / `index`; it never builds or mutates anything.
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use super::{GenericNode, ScalarText, Value};

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\[\]]*)((?:\[\d+\])*)$").unwrap());
static INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

/// Whatever a path lands on: a member value or a list element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathRef<'a> {
    Node(&'a GenericNode),
    Value(&'a Value),
}

impl<'a> PathRef<'a> {
    pub fn as_node(&self) -> Option<&'a GenericNode> {
        match *self {
            PathRef::Node(node) => Some(node),
            PathRef::Value(value) => value.as_node(),
        }
    }

    pub fn as_value(&self) -> Option<&'a Value> {
        match *self {
            PathRef::Value(value) => Some(value),
            PathRef::Node(_) => None,
        }
    }

    fn member(self, name: &str) -> Option<PathRef<'a>> {
        self.as_node()?.get(name).map(PathRef::Value)
    }

    fn element(self, index: usize) -> Option<PathRef<'a>> {
        let node = match self {
            PathRef::Node(node) => node.index(index).ok()?,
            PathRef::Value(value) => value.index(index).ok()?,
        };
        Some(PathRef::Node(node))
    }
}

impl ScalarText for PathRef<'_> {
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            PathRef::Node(node) => node.as_text(),
            PathRef::Value(value) => value.as_text(),
        }
    }
}

impl Serialize for PathRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathRef::Node(node) => node.serialize(serializer),
            PathRef::Value(value) => value.serialize(serializer),
        }
    }
}

impl GenericNode {
    /// Follow a dotted path; `None` when any step is missing or malformed.
    ///
    /// The empty path resolves to the node itself.
    pub fn path(&self, path: &str) -> Option<PathRef<'_>> {
        let mut cursor = PathRef::Node(self);
        if path.is_empty() {
            return Some(cursor);
        }
        for segment in path.split('.') {
            let caps = SEGMENT.captures(segment)?;
            let name = &caps[1];
            if !name.is_empty() {
                cursor = cursor.member(name)?;
            }
            for index in INDEX.captures_iter(&caps[2]) {
                cursor = cursor.element(index[1].parse().ok()?)?;
            }
        }
        Some(cursor)
    }
}
