//! JSON → [`GenericNode`] structural walker.
//!
//! Rules that differ from the XML walker:
//! - an array-valued property always becomes `{name}{suffix}`, even with a
//!   single element;
//! - a root (or otherwise anonymous) array is exposed under `items`, with
//!   `List` as an alias;
//! - scalar properties are stored directly as typed scalars;
//! - container nesting is bounded by `max_depth`.
pub mod lenient;

use serde::Deserialize;
use serde_json::{Map, Number};

use crate::config::{ParseOptions, SlurperConfig};
use crate::error::{Result, SlurperError};
use crate::grouping::{attach_list, attach_single, Grouping};
use crate::naming::{sanitize, NamingPolicy};
use crate::node::{GenericNode, Scalar, Value, ITEMS_MEMBER, LIST_ALIAS_MEMBER};

// ------------------------------ Front API -------------------------------- //

pub fn parse_text(content: &str, options: &ParseOptions) -> Result<GenericNode> {
    let config = options.resolve()?;
    let value = parse_value(content, config.max_depth)?;
    build_root(&value, &config)
}

/// Parse JSON text, tolerating comments and trailing commas.
///
/// Nesting is checked against `max_depth` before `serde_json` sees the text,
/// so its own recursion limit never decides which documents are accepted.
pub fn parse_value(content: &str, max_depth: usize) -> Result<serde_json::Value> {
    let relaxed = lenient::relax(content);
    check_nesting(&relaxed, max_depth)?;
    let mut deserializer = serde_json::Deserializer::from_str(&relaxed);
    deserializer.disable_recursion_limit();
    let value = serde_json::Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

/// Containers count from 0 at the root, matching the walker's depth.
fn check_nesting(src: &str, max_depth: usize) -> Result<()> {
    let mut open = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in src.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                open += 1;
                if open - 1 > max_depth {
                    return Err(SlurperError::DepthExceeded { depth: open - 1, max_depth });
                }
            }
            b']' | b'}' => open = open.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Build the tree for an already parsed document.
pub fn build_root(value: &serde_json::Value, config: &SlurperConfig) -> Result<GenericNode> {
    tracing::debug!(max_depth = config.max_depth, suffix = %config.list_suffix, "walking JSON document");
    JsonWalker::new(config).root(value)
}

// -------------------------------- Walker ---------------------------------- //

struct JsonWalker<'c> {
    config: &'c SlurperConfig,
    policy: NamingPolicy,
}

impl<'c> JsonWalker<'c> {
    fn new(config: &'c SlurperConfig) -> Self {
        Self { config, policy: config.naming_policy() }
    }

    fn root(&self, value: &serde_json::Value) -> Result<GenericNode> {
        match value {
            serde_json::Value::Object(map) => {
                let mut root = GenericNode::new();
                self.walk_object(map, &mut root, 0)?;
                Ok(root)
            }
            other => self.element_node(other, 0),
        }
    }

    /// Fail fast once `depth` passes the configured maximum.
    fn guard(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(SlurperError::DepthExceeded { depth, max_depth: self.config.max_depth });
        }
        Ok(())
    }

    fn walk_object(&self, map: &Map<String, serde_json::Value>, node: &mut GenericNode, depth: usize) -> Result<()> {
        self.guard(depth)?;
        let mut grouping = Grouping::new();
        for (key, value) in map {
            let name = sanitize(key, self.policy)?;
            grouping.push(name.into_owned(), value);
        }
        for (name, values) in grouping.into_groups() {
            match values.as_slice() {
                [value] => self.attach_property(node, name, value, depth)?,
                // distinct keys that sanitize to the same name
                _ => {
                    let items = values
                        .iter()
                        .map(|value| self.element_node(value, depth + 1))
                        .collect::<Result<Vec<_>>>()?;
                    attach_list(node, &name, &self.config.list_suffix, items);
                }
            }
        }
        Ok(())
    }

    fn attach_property(&self, node: &mut GenericNode, name: String, value: &serde_json::Value, depth: usize) -> Result<()> {
        match value {
            serde_json::Value::Null => attach_single(node, name, Value::Null),
            serde_json::Value::Object(map) => {
                let mut child = GenericNode::new();
                self.walk_object(map, &mut child, depth + 1)?;
                attach_single(node, name, Value::Node(child));
            }
            serde_json::Value::Array(items) => {
                self.guard(depth + 1)?;
                let items = self.element_nodes(items, depth + 2)?;
                attach_list(node, &name, &self.config.list_suffix, items);
            }
            scalar => attach_single(node, name, Value::Scalar(typed_scalar(scalar))),
        }
        Ok(())
    }

    /// A value that has no property name of its own: an array element, a
    /// collided member, or the document root.
    fn element_node(&self, value: &serde_json::Value, depth: usize) -> Result<GenericNode> {
        match value {
            serde_json::Value::Null => Ok(GenericNode::new()),
            serde_json::Value::Bool(b) => Ok(GenericNode::leaf(b.to_string())),
            serde_json::Value::Number(n) => Ok(GenericNode::leaf(n.to_string())),
            serde_json::Value::String(s) => Ok(GenericNode::leaf(s.as_str())),
            serde_json::Value::Object(map) => {
                let mut node = GenericNode::new();
                self.walk_object(map, &mut node, depth)?;
                Ok(node)
            }
            serde_json::Value::Array(items) => {
                self.guard(depth)?;
                let items = self.element_nodes(items, depth + 1)?;
                let mut node = GenericNode::new();
                node.insert(ITEMS_MEMBER, Value::List(items.clone()));
                node.insert(LIST_ALIAS_MEMBER, Value::List(items));
                Ok(node)
            }
        }
    }

    fn element_nodes(&self, items: &[serde_json::Value], depth: usize) -> Result<Vec<GenericNode>> {
        items.iter().map(|item| self.element_node(item, depth)).collect()
    }
}

/// Numbers widen i32 → i64 → f64, then fall back to their text.
fn typed_scalar(value: &serde_json::Value) -> Scalar {
    match value {
        serde_json::Value::Bool(b) => Scalar::Bool(*b),
        serde_json::Value::String(s) => Scalar::Text(s.clone()),
        serde_json::Value::Number(n) => typed_number(n),
        other => Scalar::Text(other.to_string()),
    }
}

fn typed_number(n: &Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(small) => Scalar::Int(small),
            Err(_) => Scalar::Long(i),
        };
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Scalar::Double(f),
        _ => Scalar::Text(n.to_string()),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractorOptions, KEY_LIST_SUFFIX, KEY_MAX_JSON_DEPTH, KEY_SANITIZE_PROPERTY_NAMES};
    use crate::node::ScalarText;

    fn parse(src: &str) -> GenericNode {
        parse_text(src, &ParseOptions::default()).unwrap()
    }

    fn parse_with(src: &str, extractor_options: ExtractorOptions) -> Result<GenericNode> {
        parse_text(src, &ParseOptions::with_extractor_options(extractor_options))
    }

    fn nested(levels: usize) -> String {
        let mut src = String::from("\"deep value\"");
        for i in (1..=levels).rev() {
            src = format!("{{\"level{i}\": {src}}}");
        }
        src
    }

    const SETTINGS: &str = r#"{
        "settings": {
            "view": { "displayIcons": true, "showFiles": false },
            "performance": {
                "additionalChecks": {
                    "disk": { "minFreeSpace": 2, "warnFreeSpace": 5.5 }
                }
            }
        }
    }"#;

    #[test]
    fn scalar_properties_are_reachable_by_name() {
        let person = parse(r#"{"Name": "Joe", "Age": 22, "CanDrive": true,
            "ContactDetails": {"Email": "joe@hotmail.com", "Mobile": "07738277382", "Fax": null}}"#);
        assert_eq!(person.get("Name").unwrap().as_text().as_deref(), Some("Joe"));
        assert_eq!(person.get("Age").unwrap().as_i32().unwrap(), 22);
        assert!(person.get("CanDrive").unwrap().as_bool().unwrap());
        let contact = person.node("ContactDetails").unwrap();
        assert_eq!(contact.as_str(), None);
        assert_eq!(contact.get("Mobile").unwrap().as_text().as_deref(), Some("07738277382"));
        assert!(contact.get("Fax").unwrap().is_null());
    }

    #[test]
    fn typed_conversions_from_nested_settings() {
        let root = parse(SETTINGS);
        let view = root.path("settings.view").unwrap();
        assert_eq!(view.as_node().unwrap().get("displayIcons").unwrap().try_as_bool(), Some(true));
        let disk = root.path("settings.performance.additionalChecks.disk").unwrap().as_node().unwrap();
        assert_eq!(disk.get("minFreeSpace").unwrap().as_i32().unwrap(), 2);
        assert_eq!(disk.get("warnFreeSpace").unwrap().as_f64().unwrap(), 5.5);
        assert_eq!(disk.get("warnFreeSpace").unwrap().as_decimal().unwrap(), rust_decimal::Decimal::new(55, 1));
        assert!(disk.get("minFreeSpace").unwrap().as_bool().is_err());
        assert!(root.path("settings.view.displayIcons").unwrap().as_i32().is_err());
    }

    #[test]
    fn numbers_widen_in_order() {
        let root = parse(r#"{"small": 7, "big": 5000000000, "real": 44.95, "huge": 18446744073709551615}"#);
        assert_eq!(root.get("small").unwrap().as_scalar(), Some(&Scalar::Int(7)));
        assert_eq!(root.get("big").unwrap().as_scalar(), Some(&Scalar::Long(5_000_000_000)));
        assert_eq!(root.get("real").unwrap().as_scalar(), Some(&Scalar::Double(44.95)));
        assert!(matches!(root.get("huge").unwrap().as_scalar(), Some(Scalar::Double(_))));
        assert_eq!(root.get("real").unwrap().as_text().as_deref(), Some("44.95"));
    }

    #[test]
    fn arrays_always_become_lists_even_with_one_element() {
        let root = parse(r#"{"book": [{"id": "bk101"}], "tags": ["a", "b", "c"]}"#);
        assert!(root.get("book").is_none());
        let books = root.list("bookList").unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].get("id").unwrap().as_text().as_deref(), Some("bk101"));
        let tags = root.list("tagsList").unwrap();
        assert_eq!(tags.iter().map(|t| t.as_str().unwrap()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_array_is_an_empty_list() {
        let root = parse(r#"{"tags": []}"#);
        assert_eq!(root.list("tagsList").unwrap().len(), 0);
    }

    #[test]
    fn null_array_elements_are_empty_nodes() {
        let root = parse(r#"{"v": [1, null]}"#);
        let v = root.list("vList").unwrap();
        assert_eq!(v[0].as_i32().unwrap(), 1);
        assert_eq!(v[1].as_str(), None);
        assert!(v[1].is_empty());
    }

    #[test]
    fn root_array_is_exposed_as_items_and_list() {
        let root = parse(r#"[{"name": "Avocado Dip"}, {"name": "Bagels, New York Style"}]"#);
        let items = root.list(ITEMS_MEMBER).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(root.list(LIST_ALIAS_MEMBER).unwrap().len(), 2);
        assert_eq!(root.index(1).unwrap().get("name").unwrap().as_text().as_deref(), Some("Bagels, New York Style"));

        let single = parse("[4862]");
        assert_eq!(single.index(0).unwrap().as_i32().unwrap(), 4862);
    }

    #[test]
    fn items_property_follows_the_array_rule() {
        let root = parse(r#"{"items":[{"name":"x"},{"name":"y"}]}"#);
        let items = root.list("itemsList").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("name").unwrap().as_text().as_deref(), Some("x"));
        assert_eq!(root.index(0).unwrap().get("name").unwrap().as_text().as_deref(), Some("x"));
    }

    #[test]
    fn nested_anonymous_arrays_expose_items() {
        let root = parse(r#"{"matrix": [[1, 2], [3]]}"#);
        let rows = root.list("matrixList").unwrap();
        assert_eq!(rows[0].list(ITEMS_MEMBER).unwrap().len(), 2);
        assert_eq!(rows[1].index(0).unwrap().as_i32().unwrap(), 3);
    }

    #[test]
    fn root_scalar_is_a_leaf() {
        let root = parse("\"hello\"");
        assert_eq!(root.as_str(), Some("hello"));
        assert!(root.is_empty());
    }

    #[test]
    fn empty_object_is_an_empty_container() {
        let root = parse("{}");
        assert!(root.is_empty());
        assert_eq!(root.as_str(), None);
    }

    #[test]
    fn null_property_is_an_explicit_null() {
        let root = parse(r#"{ "nullValue": null }"#);
        assert!(root.get("nullValue").unwrap().is_null());
        assert_eq!(root.get("nullValue").unwrap().try_as_i32(), None);
    }

    #[test]
    fn names_are_sanitized_leniently_by_default() {
        let root = parse(r#"{"invalid-property-name": "value", "123numeric-start": "numeric", "space in name": "spaced"}"#);
        assert_eq!(root.get("invalidpropertyname").unwrap().as_text().as_deref(), Some("value"));
        assert_eq!(root.get("prop123numericstart").unwrap().as_text().as_deref(), Some("numeric"));
        assert_eq!(root.get("spaceinname").unwrap().as_text().as_deref(), Some("spaced"));
    }

    #[test]
    fn strict_naming_rejects_names_that_need_fixing() {
        let err = parse_with(
            r#"{"invalid-property-name": "value"}"#,
            ExtractorOptions::new().with(KEY_SANITIZE_PROPERTY_NAMES, false),
        )
        .unwrap_err();
        assert!(matches!(err, SlurperError::NamingPolicy { ref raw_name } if raw_name == "invalid-property-name"));

        let ok = parse_with(r#"{"clean": 1}"#, ExtractorOptions::new().with(KEY_SANITIZE_PROPERTY_NAMES, false));
        assert!(ok.is_ok());
    }

    #[test]
    fn colliding_sanitized_keys_form_a_list() {
        let root = parse(r#"{"a-b": 1, "ab": 2}"#);
        let list = root.list("abList").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].as_i32().unwrap(), 2);
        assert!(root.get("ab").is_none());
    }

    #[test]
    fn depth_guard_fails_fast_and_can_be_raised() {
        let src = nested(5);
        let err = parse_with(&src, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 2)).unwrap_err();
        assert!(matches!(err, SlurperError::DepthExceeded { max_depth: 2, .. }));

        let root = parse_with(&src, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 10)).unwrap();
        let leaf = root.path("level1.level2.level3.level4.level5").unwrap();
        assert_eq!(leaf.as_text().as_deref(), Some("deep value"));
    }

    #[test]
    fn default_depth_limit_is_sixty_four() {
        let deep = nested(70);
        assert!(matches!(parse_text(&deep, &ParseOptions::default()), Err(SlurperError::DepthExceeded { .. })));
        assert!(parse_with(&deep, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 100)).is_ok());
        assert!(parse_text(&nested(60), &ParseOptions::default()).is_ok());
    }

    #[test]
    fn depth_limit_governs_documents_deeper_than_the_parser_default() {
        let deep = nested(200);
        let err = parse_text(&deep, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SlurperError::DepthExceeded { max_depth: 64, .. }));

        let root = parse_with(&deep, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 500)).unwrap();
        let path = (1..=200).map(|i| format!("level{i}")).collect::<Vec<_>>().join(".");
        assert_eq!(root.path(&path).unwrap().as_text().as_deref(), Some("deep value"));

        let brackets = format!("{}1{}", "[".repeat(150), "]".repeat(150));
        assert!(parse_with(&brackets, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 149)).is_ok());
        assert!(matches!(
            parse_with(&brackets, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 148)),
            Err(SlurperError::DepthExceeded { depth: 149, max_depth: 148 })
        ));
    }

    #[test]
    fn brackets_inside_strings_do_not_count_toward_depth() {
        let root = parse_with(r#"{"a": "[[[{{{\"]]]"}"#, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 0)).unwrap();
        assert_eq!(root.get("a").unwrap().as_text().as_deref(), Some("[[[{{{\"]]]"));
    }

    #[test]
    fn arrays_count_toward_depth() {
        let src = "[[[[1]]]]";
        assert!(parse_with(src, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 2)).is_err());
        assert!(parse_with(src, ExtractorOptions::new().with(KEY_MAX_JSON_DEPTH, 3)).is_ok());
    }

    #[test]
    fn per_call_list_suffix() {
        let root = parse_with(r#"{"item": [1, 2]}"#, ExtractorOptions::new().with(KEY_LIST_SUFFIX, "Collection")).unwrap();
        assert_eq!(root.list("itemCollection").unwrap().len(), 2);
        assert!(root.get("itemList").is_none());
    }

    #[test]
    fn comments_and_trailing_commas_are_tolerated() {
        let root = parse("{\n // note\n \"a\": [1, 2,],\n /* x */ \"b\": \"c\",\n}");
        assert_eq!(root.list("aList").unwrap().len(), 2);
        assert_eq!(root.get("b").unwrap().as_text().as_deref(), Some("c"));
    }

    #[test]
    fn malformed_json_is_a_syntax_error() {
        let err = parse_text(r#"{"a": "#, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SlurperError::Json(_)));
        assert!(err.is_syntax());
    }

    #[test]
    fn reparsing_yields_identical_independent_trees() {
        let first = parse(SETTINGS);
        let mut second = parse(SETTINGS);
        assert_eq!(first, second);
        second.insert("extra", Value::Null);
        assert_ne!(first, second);
        assert!(first.get("extra").is_none());
    }

    #[test]
    fn document_order_is_preserved() {
        let root = parse(r#"{"z": 1, "a": 2, "m": 3}"#);
        assert_eq!(root.names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }
}
