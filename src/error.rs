//! Error kinds surfaced at the `parse_text` / `parse_file` boundary.
//!
//! Parse, depth and naming failures abort the whole call. Conversion and
//! indexing failures come from navigating an already-built tree and are
//! meant to be handled per field.
use std::path::PathBuf;

use crate::node::ConversionError;

pub type Result<T, E = SlurperError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SlurperError {
    #[error("error extracting XML data: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("error extracting JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error extracting YAML data: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("error extracting CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("maximum nesting depth of {max_depth} exceeded (reached depth {depth})")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("property name '{raw_name}' is not a valid identifier and name sanitization is disabled")]
    NamingPolicy { raw_name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("cannot index [{index}]: {reason}")]
    Indexing { index: usize, reason: String },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation was cancelled")]
    Cancelled,

    #[error("no extractor found for source type: {source_type}")]
    ExtractorNotFound { source_type: String },
}

impl SlurperError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration { message: message.into() }
    }

    /// True for failures that only concern one field of an otherwise valid tree.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Conversion(_) | Self::Indexing { .. })
    }

    /// True when the underlying document text could not be understood.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Json(_) | Self::Yaml(_) | Self::Csv(_))
    }
}
