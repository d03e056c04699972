//! dataset::delimited
//!
//! CSV and TSV reader and writer.
//!
//! # Typing
//!
//! Delimited text carries no types, so each column is typed from its cells:
//! - an empty cell is `Null`
//! - every non-empty cell a canonical integer: `Integer`
//! - every non-empty cell an integer or a finite decimal: `Float`
//! - every non-empty cell `true` or `false`: `Bool`
//! - anything else: `Text`
//!
//! Integers must be canonical (`7`, not `007` or `+7`) so that identifiers
//! with leading zeros stay text. An integer beyond 2^53 in magnitude has no
//! exact `f64`, so a column mixing one with decimals is `Text` rather than a
//! `Float` column that would round it.
//!
//! # Deterministic Output
//!
//! The writer emits the header first, then rows in dataset order, with `\n`
//! terminators. Floats are always written with a decimal point or exponent,
//! so a float column never reads back as an integer column.

use super::format::{Format, FormatError};
use super::model::{fits_float_exactly, ColumnType, Dataset, Value};

fn delimiter(format: Format) -> u8 {
    match format {
        Format::Tsv => b'\t',
        _ => b',',
    }
}

/// Parse delimited text into a typed dataset.
pub(crate) fn parse(raw: &[u8], format: Format) -> Result<Dataset, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter(format))
        .has_headers(true)
        .flexible(false)
        .from_reader(raw);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(format, &e))?
        .clone();

    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    for (idx, name) in columns.iter().enumerate() {
        if name.is_empty() {
            return Err(FormatError::new(
                format,
                format!("header field {} is empty", idx + 1),
            )
            .at_line(1));
        }
        if columns[..idx].contains(name) {
            return Err(
                FormatError::new(format, "duplicate column name".to_string())
                    .at_line(1)
                    .in_column(name.clone()),
            );
        }
    }

    let mut cells = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(format, &e))?;
        cells.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Ok(type_cells(columns, cells))
}

/// Write a dataset as delimited text.
pub(crate) fn serialize(dataset: &Dataset, format: Format) -> Result<Vec<u8>, FormatError> {
    if dataset.columns().is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter(format))
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(dataset.columns())
        .map_err(|e| csv_error(format, &e))?;

    for (idx, row) in dataset.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| csv_error(format, &e).at_record(idx))?;
    }

    writer
        .into_inner()
        .map_err(|e| FormatError::new(format, e.to_string()))
}

/// Re-type a dataset the way it would read back from delimited text.
///
/// Applied after every edit, so that the working copy always equals what a
/// round trip through the file would produce.
pub(crate) fn normalize(dataset: &Dataset) -> Dataset {
    let cells = dataset
        .rows()
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    type_cells(dataset.columns().to_vec(), cells)
}

fn type_cells(columns: Vec<String>, cells: Vec<Vec<String>>) -> Dataset {
    let types: Vec<ColumnType> = (0..columns.len())
        .map(|col| infer_column(cells.iter().map(|row| row[col].as_str())))
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(cell, ty)| typed_cell(cell, *ty))
                .collect()
        })
        .collect();

    Dataset::from_rows(columns, rows).unwrap_or_default()
}

fn infer_column<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut all_int = true;
    let mut all_number = true;
    let mut all_bool = true;
    let mut seen = false;

    for cell in cells.filter(|c| !c.is_empty()) {
        seen = true;
        let int = canonical_int(cell);
        all_int &= int.is_some();
        all_number &= match int {
            Some(i) => fits_float_exactly(i),
            None => decimal(cell).is_some(),
        };
        all_bool &= cell == "true" || cell == "false";
    }

    if !seen {
        ColumnType::Any
    } else if all_int {
        ColumnType::Integer
    } else if all_number {
        ColumnType::Float
    } else if all_bool {
        ColumnType::Bool
    } else {
        ColumnType::Text
    }
}

fn typed_cell(cell: String, ty: ColumnType) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let typed = match ty {
        ColumnType::Integer => canonical_int(&cell).map(Value::Integer),
        ColumnType::Float => canonical_int(&cell)
            .filter(|i| fits_float_exactly(*i))
            .map(|i| i as f64)
            .or_else(|| decimal(&cell))
            .map(Value::Float),
        ColumnType::Bool => Some(Value::Bool(cell == "true")),
        ColumnType::Text | ColumnType::Any => None,
    };
    typed.unwrap_or(Value::Text(cell))
}

fn canonical_int(cell: &str) -> Option<i64> {
    cell.parse::<i64>().ok().filter(|n| n.to_string() == cell)
}

fn decimal(cell: &str) -> Option<f64> {
    if cell.starts_with('+') || !cell.contains(&['.', 'e', 'E'][..]) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn csv_error(format: Format, err: &csv::Error) -> FormatError {
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("found {} fields, expected {}", len, expected_len),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field() + 1),
        _ => err.to_string(),
    };

    let mut error = FormatError::new(format, message);
    if let Some(pos) = err.position() {
        error = error.at_line(pos.line());
        // Record 0 is the header row.
        if pos.record() > 0 {
            error = error.at_record(pos.record() as usize - 1);
        }
    }
    error
}
