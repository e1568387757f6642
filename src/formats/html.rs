//! HTML front-end: normalize to well-formed XML, then walk it as XML.
//!
//! `scraper` (html5ever) does the error recovery, so the result always has a
//! single `<html>` root. Re-serialization keeps local names only, reduces
//! attribute names to XML-safe characters, drops duplicate attributes,
//! comments and the doctype, and escapes all text.
use std::collections::HashSet;

use scraper::{ElementRef, Html};

use crate::config::ParseOptions;
use crate::error::Result;
use crate::formats::xml;
use crate::node::GenericNode;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub fn parse_text(content: &str, options: &ParseOptions) -> Result<GenericNode> {
    let normalized = normalize(content);
    tracing::debug!(html_bytes = content.len(), xml_bytes = normalized.len(), "normalized HTML to XML");
    xml::parse_text(&normalized, options)
}

/// Well-formed XML for an arbitrary (possibly broken) HTML document.
pub fn normalize(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() + XML_DECLARATION.len());
    out.push_str(XML_DECLARATION);
    write_element(document.root_element(), &mut out);
    out
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = xml_name(element.value().name()).unwrap_or_else(|| "_".to_string());
    out.push('<');
    out.push_str(&name);

    let mut seen = HashSet::new();
    for (raw, value) in element.value().attrs() {
        let Some(attr) = xml_name(raw) else { continue };
        if !seen.insert(attr.clone()) {
            continue;
        }
        out.push(' ');
        out.push_str(&attr);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }
    out.push('>');

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_element(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            escape_into(text, out);
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

/// Reduce a name to `[A-Za-z_][A-Za-z0-9_.-]*`; `None` if nothing usable is left.
fn xml_name(raw: &str) -> Option<String> {
    let mut name: String = raw
        .chars()
        .filter_map(|c| match c {
            ':' => Some('-'),
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') => Some(c),
            _ => None,
        })
        .collect();
    if name.is_empty() {
        return None;
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    Some(name)
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
}
