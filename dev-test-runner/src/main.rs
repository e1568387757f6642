//! Walk a directory of sample documents, extract each one and report
//! per-file outcomes.
//!
//! usage: dev-test-runner [SAMPLES_DIR] [REPORT_JSON]
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use slurp::{extract, Format, ParseOptions};

#[derive(Debug, Serialize)]
struct Outcome {
    path: PathBuf,
    format: &'static str,
    nodes: usize,
    millis: u128,
    error: Option<String>,
}

fn run_one(path: &Path, format: Format, options: &ParseOptions) -> Outcome {
    let started = Instant::now();
    let result = extract::parse_file(format, path, options);
    let millis = started.elapsed().as_millis();
    match result {
        Ok(nodes) => Outcome { path: path.to_path_buf(), format: format.name(), nodes: nodes.len(), millis, error: None },
        Err(error) => Outcome { path: path.to_path_buf(), format: format.name(), nodes: 0, millis, error: Some(error.to_string()) },
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let samples_dir = args.next().unwrap_or_else(|| "samples".to_string());
    let report_path = args.next().map(PathBuf::from);

    let pattern = format!("{}/**/*", samples_dir.trim_end_matches('/'));
    let options = ParseOptions { use_streaming: true, ..ParseOptions::default() };

    let mut outcomes = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("bad samples directory: {samples_dir}"))? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let Ok(format) = Format::from_extension(&path) else {
            eprintln!("{} {}", "skip".dimmed(), path.display());
            continue;
        };
        let outcome = run_one(&path, format, &options);
        match &outcome.error {
            None => eprintln!("✅ {} ({}, {} node(s), {}ms)", path.display(), outcome.format, outcome.nodes, outcome.millis),
            Some(error) => eprintln!("❌ {} ({}): {}", path.display(), outcome.format, error.red()),
        }
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let summary = format!("{} file(s), {} failed", outcomes.len(), failed);
    eprintln!("—— {} ——", if failed == 0 { summary.green() } else { summary.red() });

    if let Some(report_path) = report_path {
        let report = serde_json::to_string_pretty(&outcomes)?;
        std::fs::write(&report_path, report).with_context(|| format!("failed to write {}", report_path.display()))?;
    }
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
