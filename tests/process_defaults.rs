//! Process-wide defaults are shared state, so every test here holds `LOCK`
//! and restores what it changed.
use std::sync::{Mutex, PoisonError};

use slurp::config::{self, ExtractorOptions, KEY_LIST_SUFFIX};
use slurp::{extract, Format, ParseOptions, SlurperConfig, SlurperError};

static LOCK: Mutex<()> = Mutex::new(());

fn xml_items() -> slurp::GenericNode {
    let nodes = extract::parse_text(Format::Xml, "<r><item>1</item><item>2</item></r>", &ParseOptions::default()).unwrap();
    nodes.into_iter().next().unwrap()
}

#[test]
fn changing_list_suffix_affects_later_parses_and_can_be_restored() {
    let _guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let original = config::defaults();

    assert!(xml_items().contains("itemList"));

    config::set_list_suffix("Collection");
    let root = xml_items();
    assert!(root.contains("itemCollection"));
    assert!(!root.contains("itemList"));

    let json = extract::parse_text(Format::Json, r#"{"item": [1]}"#, &ParseOptions::default()).unwrap();
    assert!(json[0].contains("itemCollection"));

    config::set_defaults(original);
    assert!(xml_items().contains("itemList"));
}

#[test]
fn per_call_option_beats_process_default() {
    let _guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let original = config::defaults();

    config::set_list_suffix("Collection");
    let options = ParseOptions::with_extractor_options(ExtractorOptions::new().with(KEY_LIST_SUFFIX, "Set"));
    let nodes = extract::parse_text(Format::Xml, "<r><item/><item/></r>", &options).unwrap();
    assert!(nodes[0].contains("itemSet"));

    config::set_defaults(original);
}

#[test]
fn default_max_depth_and_naming_policy() {
    let _guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let original = config::defaults();
    let doc = r#"{"a": {"b": {"c": {"d": 1}}}}"#;

    config::set_max_depth(2);
    let err = extract::parse_text(Format::Json, doc, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, SlurperError::DepthExceeded { max_depth: 2, .. }));

    config::set_max_depth(10);
    assert!(extract::parse_text(Format::Json, doc, &ParseOptions::default()).is_ok());

    config::set_sanitize_property_names(false);
    let err = extract::parse_text(Format::Json, r#"{"bad-name": 1}"#, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, SlurperError::NamingPolicy { .. }));

    config::set_defaults(original);
    assert_eq!(config::defaults(), SlurperConfig::default());
}

#[test]
fn snapshot_is_taken_per_call() {
    let _guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let original = config::defaults();

    let options = ParseOptions::default();
    let before = options.resolve().unwrap();
    config::set_list_suffix("Bag");
    assert_eq!(before.list_suffix, original.list_suffix);
    assert_eq!(options.resolve().unwrap().list_suffix, "Bag");

    config::set_defaults(original);
}
