//! dataset::records
//!
//! JSON and JSON Lines reader and writer.
//!
//! A record file is a list of flat objects. The first record fixes the
//! column list (in key order); every other record must carry exactly the
//! same keys, in any order. Nested arrays and objects are rejected because
//! a dataset cell is always a scalar.
//!
//! Output is deterministic: keys follow column order, records follow
//! dataset order, JSON is pretty-printed with a trailing newline and JSON
//! Lines writes one compact object per line. Floats are parsed with
//! `serde_json`'s `float_roundtrip` feature, so every float written here
//! reads back bit-identical.

use serde_json::{Map, Number, Value as Json};

use super::format::{Format, FormatError};
use super::model::{Dataset, Value};

/// Parse JSON or JSON Lines into a dataset.
pub(crate) fn parse(raw: &[u8], format: Format) -> Result<Dataset, FormatError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Dataset::default());
    }

    let objects = match format {
        Format::JsonLines => parse_lines(raw)?,
        _ => parse_array(raw)?,
    };

    let columns: Vec<String> = objects
        .first()
        .map(|(_, obj)| obj.keys().cloned().collect())
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(objects.len());
    for (idx, (line, obj)) in objects.into_iter().enumerate() {
        let locate = |err: FormatError| {
            let err = err.at_record(idx);
            match line {
                Some(line) => err.at_line(line),
                None => err,
            }
        };

        if let Some(extra) = obj.keys().find(|k| !columns.contains(k)) {
            return Err(locate(
                FormatError::new(format, "unexpected key").in_column(extra.clone()),
            ));
        }

        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = obj.get(column).ok_or_else(|| {
                locate(FormatError::new(format, "missing key").in_column(column.clone()))
            })?;
            let cell = scalar(value).ok_or_else(|| {
                locate(
                    FormatError::new(format, "nested arrays and objects are not supported")
                        .in_column(column.clone()),
                )
            })?;
            row.push(cell);
        }
        rows.push(row);
    }

    Dataset::from_rows(columns, rows)
        .ok_or_else(|| FormatError::new(format, "records do not share one column set"))
}

fn parse_array(raw: &[u8]) -> Result<Vec<(Option<u64>, Map<String, Json>)>, FormatError> {
    let root: Json = serde_json::from_slice(raw).map_err(|e| json_error(Format::Json, &e))?;
    let Json::Array(items) = root else {
        return Err(FormatError::new(
            Format::Json,
            "expected a top-level array of objects",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Json::Object(obj) => Ok((None, obj)),
            _ => Err(FormatError::new(Format::Json, "expected an object").at_record(idx)),
        })
        .collect()
}

fn parse_lines(raw: &[u8]) -> Result<Vec<(Option<u64>, Map<String, Json>)>, FormatError> {
    let mut objects = Vec::new();
    for (idx, line) in raw.split(|b| *b == b'\n').enumerate() {
        let line_no = idx as u64 + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let record = objects.len();
        let value: Json = serde_json::from_slice(line).map_err(|e| {
            FormatError::new(Format::JsonLines, e.to_string())
                .at_line(line_no)
                .at_record(record)
        })?;
        match value {
            Json::Object(obj) => objects.push((Some(line_no), obj)),
            _ => {
                return Err(FormatError::new(Format::JsonLines, "expected an object")
                    .at_line(line_no)
                    .at_record(record))
            }
        }
    }
    Ok(objects)
}

fn scalar(value: &Json) -> Option<Value> {
    match value {
        Json::Null => Some(Value::Null),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64()?),
        }),
        Json::String(s) => Some(Value::Text(s.clone())),
        Json::Array(_) | Json::Object(_) => None,
    }
}

/// Write a dataset as JSON or JSON Lines.
pub(crate) fn serialize(dataset: &Dataset, format: Format) -> Result<Vec<u8>, FormatError> {
    let mut objects = Vec::with_capacity(dataset.row_count());
    for (idx, row) in dataset.rows().iter().enumerate() {
        let mut obj = Map::new();
        for (column, value) in dataset.columns().iter().zip(row) {
            let json = to_json(value).ok_or_else(|| {
                FormatError::new(format, "float is not finite")
                    .at_record(idx)
                    .in_column(column.clone())
            })?;
            obj.insert(column.clone(), json);
        }
        objects.push(Json::Object(obj));
    }

    match format {
        Format::JsonLines => {
            let mut out = Vec::new();
            for obj in &objects {
                serde_json::to_writer(&mut out, obj).map_err(|e| json_error(format, &e))?;
                out.push(b'\n');
            }
            Ok(out)
        }
        _ => {
            let mut out = serde_json::to_vec_pretty(&Json::Array(objects))
                .map_err(|e| json_error(format, &e))?;
            out.push(b'\n');
            Ok(out)
        }
    }
}

fn to_json(value: &Value) -> Option<Json> {
    Some(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Json::Number(Number::from_f64(*f)?),
        Value::Text(s) => Json::String(s.clone()),
    })
}

fn json_error(format: Format, err: &serde_json::Error) -> FormatError {
    let error = FormatError::new(format, err.to_string());
    if err.line() > 0 {
        error.at_line(err.line() as u64)
    } else {
        error
    }
}
