//! Minimal CLI: document(s) → (pretty JSON | colored outline)
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;

use slurp::config::{KEY_LIST_SUFFIX, KEY_MAX_JSON_DEPTH, KEY_SANITIZE_PROPERTY_NAMES};
use slurp::{extract, ExtractorOptions, Format, GenericNode, ParseOptions, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// read XML/JSON/YAML/CSV/HTML documents into dynamic trees and print them
#[derive(Parser, Debug)]
#[command(name = "slurp", version)]
pub struct CommandLineInterface {
    /// source format; `auto` goes by file extension, then by content
    #[arg(value_enum)]
    format: FormatArg,

    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    walk_settings: WalkSettings,

    /// dotted path to print instead of the whole tree (e.g. catalog.bookList[0])
    #[arg(long)]
    path: Option<String>,

    /// print an indented outline instead of JSON
    #[arg(long, default_value_t = false)]
    tree: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// One input after extraction.
#[derive(Debug)]
struct LoadedDocument {
    path: PathBuf,
    format: Format,
    nodes: Vec<GenericNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Auto,
    Xml,
    Json,
    Csv,
    Html,
    Yaml,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// read files above the streaming threshold through a buffered reader
    #[arg(long, default_value_t = false)]
    stream: bool,

    /// process inputs (and CSV rows) in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Args, Debug, Clone)]
struct WalkSettings {
    /// suffix for grouped sibling members (default `List`)
    #[arg(long)]
    list_suffix: Option<String>,

    /// maximum JSON/YAML nesting depth (default 64)
    #[arg(long)]
    max_depth: Option<usize>,

    /// reject names that would need sanitizing instead of fixing them
    #[arg(long, default_value_t = false)]
    strict_names: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FormatArg {
    fn fixed(self) -> Option<Format> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Xml => Some(Format::Xml),
            FormatArg::Json => Some(Format::Json),
            FormatArg::Csv => Some(Format::Csv),
            FormatArg::Html => Some(Format::Html),
            FormatArg::Yaml => Some(Format::Yaml),
        }
    }

    fn resolve(self, path: &Path) -> Result<Format> {
        if let Some(format) = self.fixed() {
            return Ok(format);
        }
        if let Ok(format) = Format::from_extension(path) {
            return Ok(format);
        }
        let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        match Format::sniff(&source) {
            Some(format) => Ok(format),
            None => bail!("cannot tell the format of {}; pass it explicitly", path.display()),
        }
    }
}

impl WalkSettings {
    fn extractor_options(&self) -> ExtractorOptions {
        let mut options = ExtractorOptions::new();
        if let Some(suffix) = &self.list_suffix {
            options.insert(KEY_LIST_SUFFIX, suffix.as_str());
        }
        if let Some(max_depth) = self.max_depth {
            options.insert(KEY_MAX_JSON_DEPTH, max_depth);
        }
        if self.strict_names {
            options.insert(KEY_SANITIZE_PROPERTY_NAMES, false);
        }
        options
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 { self.verbose }

    pub fn run(&self) -> Result<()> {
        let options = ParseOptions {
            use_streaming: self.input_settings.stream,
            enable_parallel_processing: self.input_settings.parallel,
            extractor_options: self.walk_settings.extractor_options(),
            ..ParseOptions::default()
        };
        let source_paths = resolve_file_path_patterns(&self.input_settings.input)
            .context("failed to resolve input file paths")?;

        let load = |path: &PathBuf| -> Result<LoadedDocument> {
            let format = self.format.resolve(path)?;
            let nodes = extract::parse_file(format, path, &options)
                .with_context(|| format!("failed to parse {} as {format}", path.display()))?;
            Ok(LoadedDocument { path: path.clone(), format, nodes })
        };
        let documents = if self.input_settings.parallel {
            source_paths.par_iter().map(load).collect::<Result<Vec<_>>>()?
        } else {
            source_paths.iter().map(load).collect::<Result<Vec<_>>>()?
        };

        let rendered = if self.tree {
            if self.out.is_some() {
                colored::control::set_override(false);
            }
            self.render_outline(&documents)
        } else {
            self.render_json(&documents)?
        };

        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &rendered).with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            println!("{rendered}");
        }
        Ok(())
    }

    /// One document prints bare; several print as an object keyed by path.
    fn render_json(&self, documents: &[LoadedDocument]) -> Result<String> {
        let mut by_source = serde_json::Map::new();
        for document in documents {
            by_source.insert(document.path.display().to_string(), self.select(document)?);
        }
        let value = match by_source.len() {
            1 => by_source.into_iter().next().map(|(_, v)| v).unwrap_or_default(),
            _ => serde_json::Value::Object(by_source),
        };
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn select(&self, document: &LoadedDocument) -> Result<serde_json::Value> {
        let value = match (&self.path, document.nodes.as_slice()) {
            (None, [single]) if !document.format.is_tabular() => serde_json::to_value(single)?,
            (None, rows) => serde_json::to_value(rows)?,
            (Some(selector), nodes) => {
                let picked = nodes
                    .iter()
                    .filter_map(|node| node.path(selector))
                    .map(serde_json::to_value)
                    .collect::<Result<Vec<_>, _>>()?;
                match <[_; 1]>::try_from(picked) {
                    Ok([one]) => one,
                    Err(picked) if picked.is_empty() => {
                        bail!("path '{selector}' matched nothing in {}", document.path.display())
                    }
                    Err(picked) => serde_json::Value::Array(picked),
                }
            }
        };
        Ok(value)
    }

    fn render_outline(&self, documents: &[LoadedDocument]) -> String {
        let mut out = String::new();
        for document in documents {
            let _ = writeln!(out, "{} ({})", document.path.display().to_string().bold(), document.format);
            for (index, node) in document.nodes.iter().enumerate() {
                match self.path.as_deref().map(|selector| node.path(selector)) {
                    None => outline_node(&mut out, &format!("[{index}]"), node, 1),
                    Some(Some(found)) => match (found.as_node(), found.as_value()) {
                        (Some(node), _) => outline_node(&mut out, &format!("[{index}]"), node, 1),
                        (None, Some(value)) => outline_value(&mut out, &format!("[{index}]"), value, 1),
                        (None, None) => {}
                    },
                    Some(None) => {}
                }
            }
        }
        out
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OUTLINE
// ————————————————————————————————————————————————————————————————————————————

fn outline_node(out: &mut String, label: &str, node: &GenericNode, depth: usize) {
    let pad = "  ".repeat(depth);
    match node.as_str() {
        Some(text) => {
            let _ = writeln!(out, "{pad}{} = {}", label.cyan(), text.green());
        }
        None => {
            let _ = writeln!(out, "{pad}{}", label.cyan());
        }
    }
    for (name, value) in node.members() {
        outline_value(out, name, value, depth + 1);
    }
}

fn outline_value(out: &mut String, label: &str, value: &Value, depth: usize) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Null => {
            let _ = writeln!(out, "{pad}{} = {}", label.cyan(), "null".dimmed());
        }
        Value::Scalar(scalar) => {
            let _ = writeln!(out, "{pad}{} = {}", label.cyan(), scalar.to_string().green());
        }
        Value::Node(node) => outline_node(out, label, node, depth),
        Value::List(items) => {
            let _ = writeln!(out, "{pad}{} {}", label.cyan(), format!("({} items)", items.len()).yellow());
            for (index, item) in items.iter().enumerate() {
                outline_node(out, &format!("[{index}]"), item, depth + 1);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
