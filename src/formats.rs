//! Format front-ends. Each one turns source text into a [`GenericNode`]
//! tree (CSV: one node per row) using the shared naming and grouping rules.
//!
//! [`GenericNode`]: crate::node::GenericNode
pub mod csv;
pub mod html;
pub mod json;
pub mod xml;
pub mod yaml;
