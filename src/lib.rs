//! Turn XML, JSON, YAML, CSV and HTML documents into navigable
//! [`GenericNode`] trees without declaring any types up front.
//!
//! ```no_run
//! use slurp::{extract, Format, ParseOptions, ScalarText};
//!
//! let nodes = extract::parse_text(Format::Xml, r#"<book id="bk101"><author>A</author></book>"#, &ParseOptions::default())?;
//! assert_eq!(nodes[0].get("id").unwrap().as_text().as_deref(), Some("bk101"));
//! assert_eq!(nodes[0].get("author").unwrap().as_text().as_deref(), Some("A"));
//! # Ok::<(), slurp::SlurperError>(())
//! ```
pub mod config;
pub mod error;
pub mod extract;
pub mod formats;
pub mod grouping;
pub mod naming;
pub mod node;

pub use config::{ExtractorOptions, ParseOptions, SlurperConfig};
pub use error::{Result, SlurperError};
pub use extract::{extractor_for, CancelSignal, Extractor, Format};
pub use naming::NamingPolicy;
pub use node::{ConversionError, GenericNode, PathRef, Scalar, ScalarText, TargetType, Value};
