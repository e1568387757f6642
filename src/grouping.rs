//! Sibling grouping shared by the structural walkers.
//!
//! One [`Grouping`] lives per recursion frame: children are pushed under
//! their sanitized name, then each group is attached to the parent either
//! under its bare name (singular) or under `{name}{suffix}` (list).
use indexmap::IndexMap;

use crate::naming::list_name;
use crate::node::{GenericNode, Value};

/// Children of one parent, grouped by sanitized name in first-seen order.
#[derive(Debug)]
pub struct Grouping<T> {
    groups: IndexMap<String, Vec<T>>,
}

impl<T> Default for Grouping<T> {
    fn default() -> Self { Self { groups: IndexMap::new() } }
}

impl<T> Grouping<T> {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, name: impl Into<String>, child: T) {
        self.groups.entry(name.into()).or_default().push(child);
    }

    pub fn len(&self) -> usize { self.groups.len() }

    pub fn is_empty(&self) -> bool { self.groups.is_empty() }

    pub fn into_groups(self) -> impl Iterator<Item = (String, Vec<T>)> {
        self.groups.into_iter()
    }
}

/// Store a singular member; an existing member of the same name is replaced.
pub fn attach_single(parent: &mut GenericNode, name: String, value: Value) {
    if parent.contains(&name) {
        tracing::warn!(member = %name, "member name collision, later value replaces earlier one");
    }
    parent.insert(name, value);
}

/// Store a list member under `{base}{suffix}`, extending a list already there.
pub fn attach_list(parent: &mut GenericNode, base: &str, suffix: &str, items: Vec<GenericNode>) {
    let name = list_name(base, suffix);
    match parent.get_mut(&name) {
        Some(Value::List(existing)) => existing.extend(items),
        Some(_) => {
            tracing::warn!(member = %name, "member name collision, list replaces earlier value");
            parent.insert(name, Value::List(items));
        }
        None => {
            parent.insert(name, Value::List(items));
        }
    }
}
