//! CSV front-end: one flat [`GenericNode`] per data row.
//!
//! Rows whose arity does not match the header, or that the tokenizer cannot
//! read, are skipped with a warning instead of failing the whole parse.
use std::io;

use ::csv::{ReaderBuilder, StringRecord, Trim};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ParseOptions, KEY_CSV_DIALECT};
use crate::error::{Result, SlurperError};
use crate::naming::{sanitize, NamingPolicy};
use crate::node::convert::{parse_bool, parse_i32};
use crate::node::{GenericNode, Scalar, Value};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// ————————————————————————————————————————————————————————————————————————————
// DIALECT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CsvDialect {
    pub delimiter: char,
    pub quote: char,
    pub has_header_row: bool,
    /// drop rows whose cells are all blank
    pub skip_empty_lines: bool,
    pub trim_values: bool,
    /// replaces the header row's names (the row itself is still skipped)
    pub custom_headers: Option<Vec<String>>,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            has_header_row: true,
            skip_empty_lines: true,
            trim_values: true,
            custom_headers: None,
        }
    }
}

impl CsvDialect {
    /// Dialect for one call: the `CsvDialect` extractor option, else the default.
    pub fn from_options(options: &ParseOptions) -> Result<Self> {
        Ok(options.extractor_options.get_as(KEY_CSV_DIALECT)?.unwrap_or_default())
    }

    fn reader_builder(&self) -> Result<ReaderBuilder> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(ascii_byte("Delimiter", self.delimiter)?)
            .quote(ascii_byte("Quote", self.quote)?)
            .has_headers(false)
            .flexible(true)
            .trim(if self.trim_values { Trim::All } else { Trim::None });
        Ok(builder)
    }
}

fn ascii_byte(field: &str, c: char) -> Result<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| SlurperError::invalid_configuration(format!("CSV {field} must be a single ASCII character, got {c:?}")))
}

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

pub fn parse_text(content: &str, options: &ParseOptions) -> Result<Vec<GenericNode>> {
    parse_reader(content.as_bytes(), options)
}

/// Parse rows straight off a reader, record by record.
pub fn parse_reader<R: io::Read>(reader: R, options: &ParseOptions) -> Result<Vec<GenericNode>> {
    let config = options.resolve()?;
    let dialect = CsvDialect::from_options(options)?;
    let policy = config.naming_policy();
    let mut reader = dialect.reader_builder()?.from_reader(reader);
    let mut records = reader.records();

    let mut header: Option<Vec<String>> = match &dialect.custom_headers {
        Some(names) => Some(header_names(names.iter().map(String::as_str), policy)?),
        None => None,
    };
    if dialect.has_header_row {
        match next_record(&mut records)? {
            Some(first) if header.is_none() => header = Some(header_names(first.iter(), policy)?),
            _ => {}
        }
    }

    let mut rows = Vec::new();
    let mut pending = Vec::new();
    let mut line = 0usize;
    while let Some(record) = next_record(&mut records)? {
        line += 1;
        if dialect.skip_empty_lines && record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let header = header.get_or_insert_with(|| synthetic_header(record.len()));
        if options.enable_parallel_processing {
            pending.push((line, record));
        } else if let Some(row) = row_node(header, line, &record) {
            rows.push(row);
        }
    }

    if !pending.is_empty() {
        let header = header.unwrap_or_default();
        rows = convert_parallel(&header, pending, options.max_degree_of_parallelism)?;
    }
    tracing::debug!(rows = rows.len(), "read CSV rows");
    Ok(rows)
}

/// Next readable record; unreadable ones are logged and skipped, I/O errors abort.
fn next_record<R: io::Read>(records: &mut ::csv::StringRecordsIter<'_, R>) -> Result<Option<StringRecord>> {
    for result in records.by_ref() {
        match result {
            Ok(record) => return Ok(Some(record)),
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => tracing::warn!(%error, "skipping malformed CSV row"),
        }
    }
    Ok(None)
}

fn header_names<'a>(raw: impl Iterator<Item = &'a str>, policy: NamingPolicy) -> Result<Vec<String>> {
    raw.enumerate()
        .map(|(i, name)| -> Result<String> {
            match name.trim() {
                "" => Ok(column_name(i)),
                name => Ok(sanitize(name, policy)?.into_owned()),
            }
        })
        .collect()
}

fn synthetic_header(len: usize) -> Vec<String> {
    (0..len).map(column_name).collect()
}

fn column_name(index: usize) -> String { format!("Column{}", index + 1) }

fn row_node(header: &[String], line: usize, record: &StringRecord) -> Option<GenericNode> {
    if record.len() != header.len() {
        tracing::warn!(line, expected = header.len(), found = record.len(), "skipping CSV row with mismatched column count");
        return None;
    }
    let mut row = GenericNode::new();
    for (name, cell) in header.iter().zip(record.iter()) {
        row.insert(name.as_str(), infer_cell(cell));
    }
    Some(row)
}

fn convert_parallel(header: &[String], records: Vec<(usize, StringRecord)>, threads: usize) -> Result<Vec<GenericNode>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|error| SlurperError::invalid_configuration(format!("cannot start CSV worker pool: {error}")))?;
    let rows = pool.install(|| {
        records
            .par_iter()
            .filter_map(|(line, record)| row_node(header, *line, record))
            .collect()
    });
    Ok(rows)
}

// ————————————————————————————————————————————————————————————————————————————
// CELL INFERENCE
// ————————————————————————————————————————————————————————————————————————————

/// First match wins: i32, f64, date/time, bool, text. Blank cells are null.
pub fn infer_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    let scalar = if let Some(n) = parse_i32(trimmed) {
        Scalar::Int(n)
    } else if let Some(x) = parse_plain_f64(trimmed) {
        Scalar::Double(x)
    } else if let Some(dt) = parse_datetime(trimmed) {
        Scalar::DateTime(dt)
    } else if let Some(b) = parse_bool(trimmed) {
        Scalar::Bool(b)
    } else {
        Scalar::Text(cell.to_string())
    };
    Value::Scalar(scalar)
}

/// Decimal literals only; `inf`, `NaN` and friends stay text.
fn parse_plain_f64(text: &str) -> Option<f64> {
    if !text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        return None;
    }
    text.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractorOptions, KEY_SANITIZE_PROPERTY_NAMES};
    use crate::node::ScalarText;

    const PEOPLE: &str = "Name,Age,Member Since,Active,Score\n\
                          Ann,31,2020-12-28 10:30:00,true,4.5\n\
                          Bob,,2021-01-02,FALSE,7\n";

    fn rows(src: &str) -> Vec<GenericNode> {
        parse_text(src, &ParseOptions::default()).unwrap()
    }

    fn with_dialect(dialect: serde_json::Value) -> ParseOptions {
        ParseOptions::with_extractor_options(ExtractorOptions::new().with(KEY_CSV_DIALECT, dialect))
    }

    #[test]
    fn header_row_names_the_members() {
        let rows = rows(PEOPLE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].names().collect::<Vec<_>>(), vec!["Name", "Age", "MemberSince", "Active", "Score"]);
        assert_eq!(rows[0].get("Name").unwrap().as_text().as_deref(), Some("Ann"));
    }

    #[test]
    fn cells_are_typed_in_order() {
        let rows = rows(PEOPLE);
        let ann = &rows[0];
        assert_eq!(ann.get("Age").unwrap().as_scalar(), Some(&Scalar::Int(31)));
        assert!(matches!(ann.get("MemberSince").unwrap().as_scalar(), Some(Scalar::DateTime(_))));
        assert_eq!(ann.get("Active").unwrap().as_scalar(), Some(&Scalar::Bool(true)));
        assert_eq!(ann.get("Score").unwrap().as_f64().unwrap(), 4.5);
        let bob = &rows[1];
        assert!(bob.get("Age").unwrap().is_null());
        assert_eq!(bob.get("MemberSince").unwrap().as_text().as_deref(), Some("2021-01-02T00:00:00"));
        assert!(!bob.get("Active").unwrap().as_bool().unwrap());
        assert_eq!(bob.get("Score").unwrap().as_scalar(), Some(&Scalar::Int(7)));
    }

    #[test]
    fn inference_keeps_odd_text_as_text() {
        assert_eq!(infer_cell("NaN"), Value::text("NaN"));
        assert_eq!(infer_cell("inf"), Value::text("inf"));
        assert_eq!(infer_cell("1"), Value::Scalar(Scalar::Int(1)));
        assert_eq!(infer_cell("5000000000"), Value::Scalar(Scalar::Double(5_000_000_000.0)));
        assert_eq!(infer_cell("yes"), Value::text("yes"));
        assert_eq!(infer_cell("   "), Value::Null);
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_newlines() {
        let rows = rows("id,text\n1,\"a, b\"\n2,\"line\nbreak\"\n3,\"say \"\"hi\"\"\"\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("text").unwrap().as_text().as_deref(), Some("a, b"));
        assert_eq!(rows[1].get("text").unwrap().as_text().as_deref(), Some("line\nbreak"));
        assert_eq!(rows[2].get("text").unwrap().as_text().as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn mismatched_rows_are_skipped() {
        let rows = rows("a,b\n1,2\n3\n4,5,6\n7,8\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("a").unwrap().as_i32().unwrap(), 7);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = rows("a,b\n1,2\n\n , \n3,4\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn without_header_row_columns_are_numbered() {
        let options = with_dialect(serde_json::json!({"HasHeaderRow": false}));
        let rows = parse_text("x,1\ny,2\n", &options).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Column1").unwrap().as_text().as_deref(), Some("x"));
        assert_eq!(rows[1].get("Column2").unwrap().as_i32().unwrap(), 2);
    }

    #[test]
    fn custom_delimiter_and_headers() {
        let options = with_dialect(serde_json::json!({"Delimiter": ";", "CustomHeaders": ["Key", "Amount"]}));
        let rows = parse_text("k;v\nalpha;1.25\n", &options).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Key").unwrap().as_text().as_deref(), Some("alpha"));
        assert_eq!(rows[0].get("Amount").unwrap().as_decimal().unwrap(), rust_decimal::Decimal::new(125, 2));
    }

    #[test]
    fn untrimmed_values_keep_their_spaces() {
        let options = with_dialect(serde_json::json!({"TrimValues": false}));
        let rows = parse_text("a,b\n x , 2\n", &options).unwrap();
        assert_eq!(rows[0].get("a").unwrap().as_text().as_deref(), Some(" x "));
        assert_eq!(rows[0].get("b").unwrap().as_i32().unwrap(), 2);
    }

    #[test]
    fn bad_dialect_is_a_configuration_error() {
        let err = parse_text("a\n1\n", &with_dialect(serde_json::json!({"Delimiter": "é"}))).unwrap_err();
        assert!(matches!(err, SlurperError::InvalidConfiguration { .. }));
        let err = parse_text("a\n1\n", &with_dialect(serde_json::json!({"HasHeaderRow": "yes"}))).unwrap_err();
        assert!(matches!(err, SlurperError::InvalidConfiguration { .. }));
    }

    #[test]
    fn strict_naming_applies_to_headers() {
        let options = ParseOptions::with_extractor_options(
            ExtractorOptions::new().with(KEY_SANITIZE_PROPERTY_NAMES, false),
        );
        let err = parse_text("Member Since\n1\n", &options).unwrap_err();
        assert!(matches!(err, SlurperError::NamingPolicy { .. }));
    }

    #[test]
    fn parallel_conversion_keeps_row_order() {
        let mut src = String::from("n,sq\n");
        for i in 0..500 {
            src.push_str(&format!("{i},{}\n", i * i));
        }
        src.push_str("broken\n");
        let options = ParseOptions { enable_parallel_processing: true, max_degree_of_parallelism: 3, ..ParseOptions::default() };
        let rows = parse_text(&src, &options).unwrap();
        assert_eq!(rows.len(), 500);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.get("n").unwrap().as_i32().unwrap(), i as i32);
        }
    }

    #[test]
    fn header_only_input_has_no_rows() {
        assert!(rows("a,b\n").is_empty());
        assert!(rows("").is_empty());
    }
}
