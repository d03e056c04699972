//! dataset::model
//!
//! In-memory representation of a tabular dataset.
//!
//! A [`Dataset`] is an ordered list of columns plus an ordered list of rows,
//! each row holding exactly one [`Value`] per column. Because rows are stored
//! positionally against the shared column list, every record always carries
//! the same column set.

use std::fmt;

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    /// Always finite.
    Float(f64),
    Text(String),
}

impl Value {
    /// The narrowest column type that accepts this value.
    ///
    /// `Null` fits every column, so it reports [`ColumnType::Any`].
    pub fn kind(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::Any,
            Value::Bool(_) => ColumnType::Bool,
            Value::Integer(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::Text(_) => ColumnType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse user input into a value suitable for a column of type `ty`.
    ///
    /// Used by callers that collect edits as text (the CLI). The empty string
    /// is `Null`. Returns `None` if the text cannot represent a value of `ty`.
    ///
    /// # Example
    ///
    /// ```
    /// use tabledit::dataset::{ColumnType, Value};
    ///
    /// assert_eq!(Value::from_input("99", ColumnType::Integer), Some(Value::Integer(99)));
    /// assert_eq!(Value::from_input("1.5", ColumnType::Float), Some(Value::Float(1.5)));
    /// assert_eq!(Value::from_input("abc", ColumnType::Integer), None);
    /// assert_eq!(Value::from_input("", ColumnType::Text), Some(Value::Null));
    /// ```
    pub fn from_input(input: &str, ty: ColumnType) -> Option<Value> {
        if input.is_empty() {
            return Some(Value::Null);
        }
        match ty {
            ColumnType::Integer => input.parse().ok().map(Value::Integer),
            ColumnType::Float => input
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            ColumnType::Bool => match input {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            ColumnType::Text => Some(Value::Text(input.to_string())),
            ColumnType::Any => Some(
                [ColumnType::Integer, ColumnType::Float, ColumnType::Bool]
                    .into_iter()
                    .find_map(|t| Value::from_input(input, t))
                    .unwrap_or_else(|| Value::Text(input.to_string())),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Largest integer magnitude an `f64` holds exactly (2^53).
pub const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// Whether `i` converts to `f64` and back without rounding.
pub fn fits_float_exactly(i: i64) -> bool {
    i.unsigned_abs() <= MAX_EXACT_FLOAT_INT
}

/// Render a float so that it never reads back as an integer.
pub(crate) fn format_float(x: f64) -> String {
    let s = x.to_string();
    if s.contains(&['.', 'e', 'E'][..]) {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Type of a column, inferred from its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    /// Floats, possibly mixed with integers.
    Float,
    Bool,
    Text,
    /// All values null, or incompatible types mixed (JSON only).
    Any,
}

impl ColumnType {
    /// Combine the types of two non-null values.
    pub(crate) fn unify(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Any,
        }
    }

    /// Whether a value may be stored in a column of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Any, _) => true,
            (ColumnType::Float, Value::Integer(_)) => true,
            (ty, v) => ty == v.kind(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Text => "text",
            ColumnType::Any => "any",
        };
        f.write_str(name)
    }
}

/// An ordered set of records sharing one column list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from rows already aligned to `columns`.
    ///
    /// Returns `None` if any row has the wrong number of cells.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Option<Self> {
        if rows.iter().any(|r| r.len() != columns.len()) {
            return None;
        }
        Some(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A single cell, if both row and column exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Infer a column's type from its non-null values.
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        let col = self.column_index(column)?;
        let inferred = self
            .rows
            .iter()
            .map(|r| &r[col])
            .filter(|v| !v.is_null())
            .map(Value::kind)
            .reduce(ColumnType::unify);
        Some(inferred.unwrap_or(ColumnType::Any))
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }
}
