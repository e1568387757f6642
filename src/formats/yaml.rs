//! YAML front-end. Documents are read into the JSON value model and walked
//! by the JSON walker, so lists, depth and naming behave exactly as for JSON.
//!
//! `serde_yaml` refuses nesting past its own fixed ceiling. Below that
//! ceiling the configured depth decides; a configured depth above it cannot
//! admit deeper YAML.
use crate::config::ParseOptions;
use crate::error::{Result, SlurperError};
use crate::formats::json;
use crate::node::GenericNode;

const PARSER_DEPTH_CEILING: usize = 128;

pub fn parse_text(content: &str, options: &ParseOptions) -> Result<GenericNode> {
    let config = options.resolve()?;
    json::build_root(&parse_value(content, config.max_depth)?, &config)
}

pub fn parse_value(content: &str, max_depth: usize) -> Result<serde_json::Value> {
    serde_yaml::from_str(content).map_err(|error| {
        if max_depth < PARSER_DEPTH_CEILING && error.to_string().contains("recursion limit exceeded") {
            SlurperError::DepthExceeded { depth: PARSER_DEPTH_CEILING, max_depth }
        } else {
            error.into()
        }
    })
}
