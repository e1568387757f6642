//! Format-dispatching entry points over the front-ends.
//!
//! [`parse_text`] and [`parse_file`] are the synchronous boundary where every
//! failure surfaces; the `_async` variants run the same work on tokio's
//! blocking pool and honor a [`CancelSignal`].
pub mod cancel;
pub mod validate;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParseOptions;
use crate::error::{Result, SlurperError};
use crate::formats::{csv, html, json, xml, yaml};
use crate::node::GenericNode;

pub use cancel::CancelSignal;
pub use validate::{validate_file_path, validate_source};

static YAML_KEY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][\w.-]*:(\s|$)").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// FORMAT REGISTRY
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Xml,
    Json,
    Csv,
    Html,
    Yaml,
}

impl Format {
    pub const ALL: [Format; 5] = [Format::Xml, Format::Json, Format::Csv, Format::Html, Format::Yaml];

    pub fn name(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Html => "html",
            Format::Yaml => "yaml",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "html" | "htm" => Ok(Format::Html),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(SlurperError::ExtractorNotFound { source_type: name.to_string() }),
        }
    }

    pub fn from_extension(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        Self::from_name(extension).map_err(|_| SlurperError::ExtractorNotFound {
            source_type: format!("file extension '{extension}' ({})", path.display()),
        })
    }

    /// Guess the format from the first bytes of a document.
    pub fn sniff(source: &str) -> Option<Self> {
        let text = source.trim_start_matches('\u{feff}').trim_start();
        let head: String = text.chars().take(512).collect::<String>().to_ascii_lowercase();
        if head.starts_with('<') {
            let html = head.starts_with("<!doctype html") || head.contains("<html") || head.contains("<body");
            return Some(if html { Format::Html } else { Format::Xml });
        }
        if head.starts_with('{') || head.starts_with('[') {
            return Some(Format::Json);
        }
        let first_line = text.lines().next().unwrap_or_default();
        if head.starts_with("---") || YAML_KEY_LINE.is_match(first_line) || first_line.starts_with("- ") {
            return Some(Format::Yaml);
        }
        if first_line.contains([',', ';', '\t']) {
            return Some(Format::Csv);
        }
        None
    }

    /// CSV yields one node per row; every other format yields one tree.
    pub fn is_tabular(self) -> bool { self == Format::Csv }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Format {
    type Err = SlurperError;
    fn from_str(s: &str) -> Result<Self> { Self::from_name(s) }
}

// ————————————————————————————————————————————————————————————————————————————
// EXTRACTORS
// ————————————————————————————————————————————————————————————————————————————

pub trait Extractor: Send + Sync {
    fn format(&self) -> Format;

    /// Parse then walk, checking `cancel` before each step.
    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>>;

    fn extract(&self, source: &str, options: &ParseOptions) -> Result<Vec<GenericNode>> {
        self.extract_with(source, options, &CancelSignal::new())
    }

    fn extract_from_file_with(&self, path: &Path, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        cancel.check()?;
        let source = read_source(path, options)?;
        self.extract_with(&source, options, cancel)
    }

    fn extract_from_file(&self, path: &Path, options: &ParseOptions) -> Result<Vec<GenericNode>> {
        self.extract_from_file_with(path, options, &CancelSignal::new())
    }
}

pub struct XmlExtractor;
pub struct JsonExtractor;
pub struct CsvExtractor;
pub struct HtmlExtractor;
pub struct YamlExtractor;

impl Extractor for XmlExtractor {
    fn format(&self) -> Format { Format::Xml }

    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        let config = options.resolve()?;
        cancel.check()?;
        let document = xml::parse_document(source)?;
        cancel.check()?;
        Ok(vec![xml::build_root(&document, &config)?])
    }
}

impl Extractor for HtmlExtractor {
    fn format(&self) -> Format { Format::Html }

    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        let config = options.resolve()?;
        cancel.check()?;
        let normalized = html::normalize(source);
        let document = xml::parse_document(&normalized)?;
        cancel.check()?;
        Ok(vec![xml::build_root(&document, &config)?])
    }
}

impl Extractor for JsonExtractor {
    fn format(&self) -> Format { Format::Json }

    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        let config = options.resolve()?;
        cancel.check()?;
        let value = json::parse_value(source, config.max_depth)?;
        cancel.check()?;
        Ok(vec![json::build_root(&value, &config)?])
    }
}

impl Extractor for YamlExtractor {
    fn format(&self) -> Format { Format::Yaml }

    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        let config = options.resolve()?;
        cancel.check()?;
        let value = yaml::parse_value(source, config.max_depth)?;
        cancel.check()?;
        Ok(vec![json::build_root(&value, &config)?])
    }
}

impl Extractor for CsvExtractor {
    fn format(&self) -> Format { Format::Csv }

    fn extract_with(&self, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        cancel.check()?;
        csv::parse_text(source, options)
    }

    /// Large files are read record by record instead of loaded whole.
    fn extract_from_file_with(&self, path: &Path, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
        cancel.check()?;
        let len = file_len(path)?;
        if options.use_streaming && len > options.streaming_threshold {
            tracing::debug!(path = %path.display(), len, "streaming CSV file");
            let file = File::open(path).map_err(|error| io_error(path, error))?;
            let reader = BufReader::with_capacity(options.streaming_buffer_size.max(1), file);
            return csv::parse_reader(reader, options);
        }
        let source = fs::read_to_string(path).map_err(|error| io_error(path, error))?;
        cancel.check()?;
        csv::parse_text(&source, options)
    }
}

pub fn extractor_for(format: Format) -> Box<dyn Extractor> {
    match format {
        Format::Xml => Box::new(XmlExtractor),
        Format::Json => Box::new(JsonExtractor),
        Format::Csv => Box::new(CsvExtractor),
        Format::Html => Box::new(HtmlExtractor),
        Format::Yaml => Box::new(YamlExtractor),
    }
}

/// Look an extractor up by format name (`"xml"`, `"yml"`, ...).
pub fn extractor_for_name(name: &str) -> Result<Box<dyn Extractor>> {
    Format::from_name(name).map(extractor_for)
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

pub fn parse_text(format: Format, source: &str, options: &ParseOptions) -> Result<Vec<GenericNode>> {
    parse_text_with(format, source, options, &CancelSignal::new())
}

pub fn parse_file(format: Format, path: &Path, options: &ParseOptions) -> Result<Vec<GenericNode>> {
    parse_file_with(format, path, options, &CancelSignal::new())
}

pub async fn parse_text_async(format: Format, source: String, options: ParseOptions, cancel: CancelSignal) -> Result<Vec<GenericNode>> {
    cancel.check()?;
    run_blocking(move || parse_text_with(format, &source, &options, &cancel)).await
}

pub async fn parse_file_async(format: Format, path: PathBuf, options: ParseOptions, cancel: CancelSignal) -> Result<Vec<GenericNode>> {
    cancel.check()?;
    run_blocking(move || parse_file_with(format, &path, &options, &cancel)).await
}

fn parse_text_with(format: Format, source: &str, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
    validate_source(source)?;
    tracing::info!(%format, bytes = source.len(), "extracting from text");
    let result = extractor_for(format).extract_with(source, options, cancel);
    report(format, &result);
    result
}

fn parse_file_with(format: Format, path: &Path, options: &ParseOptions, cancel: &CancelSignal) -> Result<Vec<GenericNode>> {
    validate_file_path(path)?;
    tracing::info!(%format, path = %path.display(), "extracting from file");
    let result = extractor_for(format).extract_from_file_with(path, options, cancel);
    report(format, &result);
    result
}

fn report(format: Format, result: &Result<Vec<GenericNode>>) {
    match result {
        Ok(nodes) => tracing::info!(%format, nodes = nodes.len(), "extraction finished"),
        Err(SlurperError::Cancelled) => tracing::info!(%format, "extraction cancelled"),
        Err(error) => tracing::error!(%format, %error, "extraction failed"),
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(error) if error.is_cancelled() => Err(SlurperError::Cancelled),
        Err(error) => std::panic::resume_unwind(error.into_panic()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FILE READING
// ————————————————————————————————————————————————————————————————————————————

/// Whole file as text; buffered when streaming is on and the file is large.
pub fn read_source(path: &Path, options: &ParseOptions) -> Result<String> {
    let len = file_len(path)?;
    if !(options.use_streaming && len > options.streaming_threshold) {
        return fs::read_to_string(path).map_err(|error| io_error(path, error));
    }
    tracing::debug!(path = %path.display(), len, buffer = options.streaming_buffer_size, "streaming file");
    let file = File::open(path).map_err(|error| io_error(path, error))?;
    let mut reader = BufReader::with_capacity(options.streaming_buffer_size.max(1), file);
    let mut source = String::with_capacity(usize::try_from(len).unwrap_or_default());
    reader.read_to_string(&mut source).map_err(|error| io_error(path, error))?;
    Ok(source)
}

fn file_len(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|error| io_error(path, error))?;
    if !metadata.is_file() {
        return Err(io_error(path, io::Error::new(io::ErrorKind::InvalidInput, "not a regular file")));
    }
    Ok(metadata.len())
}

fn io_error(path: &Path, source: io::Error) -> SlurperError {
    match source.kind() {
        io::ErrorKind::NotFound => SlurperError::FileNotFound { path: path.to_path_buf() },
        _ => SlurperError::Io { path: path.to_path_buf(), source },
    }
}
