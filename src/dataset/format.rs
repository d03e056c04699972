//! dataset::format
//!
//! Supported on-disk formats and the errors raised while reading them.

use std::fmt;

use thiserror::Error;

use crate::core::types::StorePath;

/// A dataset serialisation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated values with a header row.
    Csv,
    /// Tab-separated values with a header row.
    Tsv,
    /// A JSON array of flat objects.
    Json,
    /// One flat JSON object per line.
    JsonLines,
}

impl Format {
    /// All supported formats.
    pub fn all() -> &'static [Format] {
        &[Format::Csv, Format::Tsv, Format::Json, Format::JsonLines]
    }

    /// The name used for explicit format hints.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Tsv => "tsv",
            Format::Json => "json",
            Format::JsonLines => "jsonl",
        }
    }

    /// Parse an explicit format hint (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use tabledit::dataset::Format;
    ///
    /// assert_eq!(Format::parse("CSV"), Some(Format::Csv));
    /// assert_eq!(Format::parse("ndjson"), Some(Format::JsonLines));
    /// assert_eq!(Format::parse("xlsx"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(Format::Csv),
            "tsv" | "tab" => Some(Format::Tsv),
            "json" => Some(Format::Json),
            "jsonl" | "ndjson" => Some(Format::JsonLines),
            _ => None,
        }
    }

    /// Select a format from a path's extension.
    pub fn from_path(path: &StorePath) -> Option<Self> {
        path.extension().and_then(Self::parse)
    }

    /// Whether the format is a delimited text table.
    pub fn is_delimited(&self) -> bool {
        matches!(self, Format::Csv | Format::Tsv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Malformed dataset content.
///
/// Carries the first offending location when it is known: a 1-based line
/// for text positions, a 0-based record index, and a column name.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{format} {}: {message}", location(.line, .record, .column))]
pub struct FormatError {
    pub format: Format,
    pub line: Option<u64>,
    pub record: Option<usize>,
    pub column: Option<String>,
    pub message: String,
}

impl FormatError {
    pub(crate) fn new(format: Format, message: impl Into<String>) -> Self {
        Self {
            format,
            line: None,
            record: None,
            column: None,
            message: message.into(),
        }
    }

    pub(crate) fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub(crate) fn at_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }

    pub(crate) fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

fn location(line: &Option<u64>, record: &Option<usize>, column: &Option<String>) -> String {
    let mut parts = Vec::new();
    if let Some(line) = line {
        parts.push(format!("line {}", line));
    }
    if let Some(record) = record {
        parts.push(format!("record {}", record));
    }
    if let Some(column) = column {
        parts.push(format!("column '{}'", column));
    }
    if parts.is_empty() {
        "content".to_string()
    } else {
        parts.join(", ")
    }
}
