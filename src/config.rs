//! Walker configuration: process-wide defaults plus per-call options.
//!
//! The defaults are read exactly once per parse call (see
//! [`ParseOptions::resolve`]) and the resulting [`SlurperConfig`] is threaded
//! through the whole walk. Mutating a default while a parse is running only
//! affects parses that start afterwards.
use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlurperError};
use crate::naming::NamingPolicy;

pub const DEFAULT_LIST_SUFFIX: &str = "List";
pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_STREAMING_THRESHOLD: u64 = 1024 * 1024;
pub const DEFAULT_STREAMING_BUFFER_SIZE: usize = 4096;
pub const DEFAULT_MAX_DEGREE_OF_PARALLELISM: usize = 4;

// Keys understood in `ExtractorOptions`.
pub const KEY_MAX_JSON_DEPTH: &str = "MaxJsonDepth";
pub const KEY_SANITIZE_PROPERTY_NAMES: &str = "SanitizePropertyNames";
pub const KEY_LIST_SUFFIX: &str = "ListSuffix";
pub const KEY_CSV_DIALECT: &str = "CsvDialect";

// ————————————————————————————————————————————————————————————————————————————
// WALKER CONFIG
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SlurperConfig {
    /// appended to a member name when same-named siblings form a list
    pub list_suffix: String,
    /// maximum JSON container nesting
    pub max_depth: usize,
    /// `true` fixes bad names, `false` rejects them
    pub sanitize_property_names: bool,
}

impl Default for SlurperConfig {
    fn default() -> Self {
        Self {
            list_suffix: DEFAULT_LIST_SUFFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            sanitize_property_names: true,
        }
    }
}

impl SlurperConfig {
    pub fn naming_policy(&self) -> NamingPolicy {
        NamingPolicy::from_sanitize_flag(self.sanitize_property_names)
    }
}

static DEFAULTS: Lazy<RwLock<SlurperConfig>> = Lazy::new(|| RwLock::new(SlurperConfig::default()));

/// Copy of the current process-wide defaults.
pub fn defaults() -> SlurperConfig {
    DEFAULTS.read().unwrap_or_else(PoisonError::into_inner).clone()
}

pub fn set_defaults(config: SlurperConfig) {
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = config;
}

pub fn set_list_suffix(suffix: impl Into<String>) {
    DEFAULTS.write().unwrap_or_else(PoisonError::into_inner).list_suffix = suffix.into();
}

pub fn set_max_depth(max_depth: usize) {
    DEFAULTS.write().unwrap_or_else(PoisonError::into_inner).max_depth = max_depth;
}

pub fn set_sanitize_property_names(enabled: bool) {
    DEFAULTS.write().unwrap_or_else(PoisonError::into_inner).sanitize_property_names = enabled;
}

// ————————————————————————————————————————————————————————————————————————————
// PER-CALL OPTIONS
// ————————————————————————————————————————————————————————————————————————————

/// Open string-keyed bag of per-call overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractorOptions(IndexMap<String, serde_json::Value>);

impl ExtractorOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        let Some(value) = self.0.get(key) else { return Ok(None) };
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a non-negative integer", value))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.0.get(key) else { return Ok(None) };
        value.as_bool().map(Some).ok_or_else(|| wrong_type(key, "a boolean", value))
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        let Some(value) = self.0.get(key) else { return Ok(None) };
        value.as_str().map(Some).ok_or_else(|| wrong_type(key, "a string", value))
    }

    /// Deserialize a structured entry (e.g. a CSV dialect).
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.0.get(key) else { return Ok(None) };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|error| SlurperError::invalid_configuration(format!("option '{key}': {error}")))
    }
}

fn wrong_type(key: &str, expected: &str, value: &serde_json::Value) -> SlurperError {
    SlurperError::invalid_configuration(format!("option '{key}' must be {expected}, got {value}"))
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParseOptions {
    /// read large files through a buffered reader instead of one allocation
    pub use_streaming: bool,
    /// file size above which `use_streaming` kicks in
    pub streaming_threshold: u64,
    pub streaming_buffer_size: usize,
    /// convert CSV rows on a thread pool
    pub enable_parallel_processing: bool,
    pub max_degree_of_parallelism: usize,
    pub extractor_options: ExtractorOptions,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            use_streaming: false,
            streaming_threshold: DEFAULT_STREAMING_THRESHOLD,
            streaming_buffer_size: DEFAULT_STREAMING_BUFFER_SIZE,
            enable_parallel_processing: false,
            max_degree_of_parallelism: DEFAULT_MAX_DEGREE_OF_PARALLELISM,
            extractor_options: ExtractorOptions::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_extractor_options(extractor_options: ExtractorOptions) -> Self {
        Self { extractor_options, ..Self::default() }
    }

    /// Snapshot the process defaults and apply this call's overrides.
    pub fn resolve(&self) -> Result<SlurperConfig> {
        let mut config = defaults();
        let bag = &self.extractor_options;
        if let Some(max_depth) = bag.get_usize(KEY_MAX_JSON_DEPTH)? {
            config.max_depth = max_depth;
        }
        if let Some(sanitize) = bag.get_bool(KEY_SANITIZE_PROPERTY_NAMES)? {
            config.sanitize_property_names = sanitize;
        }
        if let Some(suffix) = bag.get_str(KEY_LIST_SUFFIX)? {
            config.list_suffix = suffix.to_string();
        }
        Ok(config)
    }
}
