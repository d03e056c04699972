//! session
//!
//! The in-memory working copy of a dataset and the edits applied to it.
//!
//! # Invariants
//!
//! - Operations apply in submission order
//! - A rejected operation leaves the dataset untouched: every operation runs
//!   against a scratch copy that replaces the working copy only on success
//! - After every accepted operation the working copy equals what a round
//!   trip through the session's format would produce
//!
//! Rows are addressed by their current zero-based position, so deleting a
//! row shifts the ids of every row after it.
//!
//! # Example
//!
//! ```
//! use tabledit::dataset::{parse, Format, Value};
//! use tabledit::session::{EditOperation, EditSession};
//!
//! let dataset = parse(b"id,val\n1,10\n2,20\n", Format::Csv).unwrap();
//! let mut session = EditSession::new(dataset, Format::Csv);
//! assert!(!session.is_dirty());
//!
//! session
//!     .apply(EditOperation::set_cell(0, "val", Value::Integer(99)))
//!     .unwrap();
//! assert!(session.is_dirty());
//! assert_eq!(session.dataset().cell(0, "val"), Some(&Value::Integer(99)));
//!
//! // Unknown columns are rejected without touching the data.
//! assert!(session
//!     .apply(EditOperation::set_cell(0, "nope", Value::Integer(1)))
//!     .is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::dataset::{self, ColumnType, Dataset, Format, Value};

/// A single edit to a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation {
    /// Replace one cell.
    SetCell {
        row: usize,
        column: String,
        value: Value,
    },
    /// Append a record; its keys must equal the column set.
    AddRow { record: BTreeMap<String, Value> },
    /// Remove a row.
    DeleteRow { row: usize },
}

impl EditOperation {
    pub fn set_cell(row: usize, column: impl Into<String>, value: Value) -> Self {
        EditOperation::SetCell {
            row,
            column: column.into(),
            value,
        }
    }

    pub fn add_row<K: Into<String>>(record: impl IntoIterator<Item = (K, Value)>) -> Self {
        EditOperation::AddRow {
            record: record.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn delete_row(row: usize) -> Self {
        EditOperation::DeleteRow { row }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOperation::SetCell { row, column, value } => {
                write!(f, "set row {} {} = {:?}", row, column, value.to_string())
            }
            EditOperation::AddRow { record } => write!(f, "add row ({} fields)", record.len()),
            EditOperation::DeleteRow { row } => write!(f, "delete row {}", row),
        }
    }
}

/// Why an edit was rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("row {row} does not exist (dataset has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{column}' holds {expected} values, got {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },

    #[error("column '{0}' cannot hold a non-finite float")]
    NonFiniteFloat(String),

    #[error("{value} cannot be stored exactly in float column '{column}'")]
    ImpreciseInteger { column: String, value: i64 },

    #[error(
        "record does not match the columns (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    ColumnMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("dataset has no columns")]
    NoColumns,

    #[error("invalid column list: {0}")]
    InvalidColumns(String),

    #[error("no editable dataset (pipeline is {0})")]
    NotEditable(String),
}

/// Working copy of one dataset plus the edits applied since load.
#[derive(Debug, Clone)]
pub struct EditSession {
    dataset: Dataset,
    format: Format,
    applied: Vec<EditOperation>,
    dirty: bool,
}

impl EditSession {
    /// Start a session over freshly loaded content.
    pub fn new(dataset: Dataset, format: Format) -> Self {
        Self {
            dataset,
            format,
            applied: Vec::new(),
            dirty: false,
        }
    }

    /// Start a session over content that does not exist remotely yet.
    ///
    /// The session is dirty from the start so the first publish writes it.
    pub fn unsaved(dataset: Dataset, format: Format) -> Self {
        Self {
            dirty: true,
            ..Self::new(dataset, format)
        }
    }

    /// Apply one operation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the operation does not fit the dataset.
    /// The dataset is unchanged in that case.
    pub fn apply(&mut self, op: EditOperation) -> Result<(), ValidationError> {
        let mut scratch = self.dataset.clone();
        apply_to(&mut scratch, &op, self.format)?;
        self.dataset = dataset::normalize(&scratch, self.format);
        self.applied.push(op);
        self.dirty = true;
        Ok(())
    }

    /// Whether anything changed since load or the last publish.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Operations accepted since load or the last publish.
    pub fn applied(&self) -> &[EditOperation] {
        &self.applied
    }

    /// Record that the working copy now matches the remote.
    pub fn mark_clean(&mut self) {
        self.applied.clear();
        self.dirty = false;
    }

    /// Consume the session, returning the accepted operations.
    pub fn into_applied(self) -> Vec<EditOperation> {
        self.applied
    }
}

fn apply_to(dataset: &mut Dataset, op: &EditOperation, format: Format) -> Result<(), ValidationError> {
    match op {
        EditOperation::SetCell { row, column, value } => {
            let col = dataset
                .column_index(column)
                .ok_or_else(|| ValidationError::UnknownColumn(column.clone()))?;
            check_row(dataset, *row)?;
            check_value(dataset, column, value, format)?;
            dataset.rows_mut()[*row][col] = value.clone();
        }
        EditOperation::AddRow { record } => {
            if dataset.columns().is_empty() {
                return Err(ValidationError::NoColumns);
            }
            let missing: Vec<String> = dataset
                .columns()
                .iter()
                .filter(|c| !record.contains_key(*c))
                .cloned()
                .collect();
            let unexpected: Vec<String> = record
                .keys()
                .filter(|k| dataset.column_index(k).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() || !unexpected.is_empty() {
                return Err(ValidationError::ColumnMismatch {
                    missing,
                    unexpected,
                });
            }

            let mut row = Vec::with_capacity(dataset.columns().len());
            for column in dataset.columns() {
                let value = &record[column];
                check_value(dataset, column, value, format)?;
                row.push(value.clone());
            }
            dataset.rows_mut().push(row);
        }
        EditOperation::DeleteRow { row } => {
            check_row(dataset, *row)?;
            dataset.rows_mut().remove(*row);
        }
    }
    Ok(())
}

fn check_row(dataset: &Dataset, row: usize) -> Result<(), ValidationError> {
    if row >= dataset.row_count() {
        return Err(ValidationError::RowOutOfRange {
            row,
            rows: dataset.row_count(),
        });
    }
    Ok(())
}

fn check_value(
    dataset: &Dataset,
    column: &str,
    value: &Value,
    format: Format,
) -> Result<(), ValidationError> {
    if let Value::Float(f) = value {
        if !f.is_finite() {
            return Err(ValidationError::NonFiniteFloat(column.to_string()));
        }
    }

    let expected = dataset
        .column_type(column)
        .ok_or_else(|| ValidationError::UnknownColumn(column.to_string()))?;
    if !expected.accepts(value) {
        return Err(ValidationError::TypeMismatch {
            column: column.to_string(),
            expected,
            found: value.kind(),
        });
    }
    // Delimited formats widen integers in a float column to f64.
    if let (ColumnType::Float, Value::Integer(i), true) = (expected, value, format.is_delimited()) {
        if !dataset::fits_float_exactly(*i) {
            return Err(ValidationError::ImpreciseInteger {
                column: column.to_string(),
                value: *i,
            });
        }
    }
    Ok(())
}
