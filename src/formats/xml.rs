//! XML → [`GenericNode`] structural walker.
//!
//! Attributes become scalar members. Child elements are grouped by sanitized
//! local name: a lone child stays singular, two or more same-named siblings
//! become `{name}{suffix}`. A node without element children carries its
//! text (CDATA included) as self-scalar. Comments and processing
//! instructions never produce anything.
use roxmltree::{Document, Node, ParsingOptions};

use crate::config::{ParseOptions, SlurperConfig};
use crate::error::Result;
use crate::grouping::{attach_list, attach_single, Grouping};
use crate::naming::{sanitize, NamingPolicy};
use crate::node::{GenericNode, Value};

pub fn parse_text(content: &str, options: &ParseOptions) -> Result<GenericNode> {
    let config = options.resolve()?;
    let document = parse_document(content)?;
    build_root(&document, &config)
}

/// Well-formed XML, DOCTYPE declarations included.
pub fn parse_document(content: &str) -> Result<Document<'_>> {
    let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
    Ok(Document::parse_with_options(content, options)?)
}

/// Build the tree rooted at the document element.
pub fn build_root(document: &Document<'_>, config: &SlurperConfig) -> Result<GenericNode> {
    tracing::debug!(root = document.root_element().tag_name().name(), suffix = %config.list_suffix, "walking XML document");
    XmlWalker { config, policy: config.naming_policy() }.element(document.root_element())
}

struct XmlWalker<'c> {
    config: &'c SlurperConfig,
    policy: NamingPolicy,
}

impl XmlWalker<'_> {
    fn element(&self, element: Node<'_, '_>) -> Result<GenericNode> {
        let mut node = GenericNode::new();

        for attribute in element.attributes() {
            let name = sanitize(attribute.name(), self.policy)?;
            attach_single(&mut node, name.into_owned(), Value::text(attribute.value()));
        }

        let mut grouping = Grouping::new();
        for child in element.children().filter(|child| child.is_element()) {
            let name = sanitize(child.tag_name().name(), self.policy)?;
            grouping.push(name.into_owned(), child);
        }

        if grouping.is_empty() {
            node.set_scalar(own_text(element));
        }

        for (name, children) in grouping.into_groups() {
            match children.as_slice() {
                [child] => {
                    let child = self.element(*child)?;
                    attach_single(&mut node, name, Value::Node(child));
                }
                _ => {
                    let items = children
                        .iter()
                        .map(|child| self.element(*child))
                        .collect::<Result<Vec<_>>>()?;
                    attach_list(&mut node, &name, &self.config.list_suffix, items);
                }
            }
        }
        Ok(node)
    }
}

/// Concatenated text and CDATA children; `None` when there is nothing but
/// whitespace.
fn own_text(element: Node<'_, '_>) -> Option<String> {
    let text: String = element.children().filter(|child| child.is_text()).filter_map(|child| child.text()).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

// ------------------------------- Tests ------------------------------------ //
