//! dataset
//!
//! Parsing fetched content into a [`Dataset`] and serialising it back.
//!
//! # Modules
//!
//! - `model`: [`Dataset`], [`Value`], [`ColumnType`]
//! - `format`: [`Format`] selection and [`FormatError`]
//! - `delimited`: CSV and TSV
//! - `records`: JSON and JSON Lines
//!
//! # Round Trip
//!
//! Serialisation is deterministic and `parse(&serialize(d, f)?, f) == d`
//! for every dataset the edit session can produce. Delimited formats infer
//! types from text, so the session passes each edited dataset through
//! [`normalize`] to keep the working copy equal to what the file will hold.
//!
//! # Example
//!
//! ```
//! use tabledit::dataset::{parse, serialize, Format, Value};
//!
//! let d = parse(b"id,val\n1,10\n2,20\n", Format::Csv).unwrap();
//! assert_eq!(d.cell(1, "val"), Some(&Value::Integer(20)));
//! assert_eq!(serialize(&d, Format::Csv).unwrap(), b"id,val\n1,10\n2,20\n");
//! ```

mod delimited;
mod format;
mod model;
mod records;

pub use format::{Format, FormatError};
pub use model::{fits_float_exactly, ColumnType, Dataset, Value, MAX_EXACT_FLOAT_INT};

/// Parse raw file content.
///
/// # Errors
///
/// Returns `FormatError` with the first offending location on malformed input.
pub fn parse(raw: &[u8], format: Format) -> Result<Dataset, FormatError> {
    if format.is_delimited() {
        delimited::parse(raw, format)
    } else {
        records::parse(raw, format)
    }
}

/// Serialise a dataset to raw file content.
pub fn serialize(dataset: &Dataset, format: Format) -> Result<Vec<u8>, FormatError> {
    if format.is_delimited() {
        delimited::serialize(dataset, format)
    } else {
        records::serialize(dataset, format)
    }
}

/// Bring a dataset to the form it takes after a round trip through `format`.
pub fn normalize(dataset: &Dataset, format: Format) -> Dataset {
    if format.is_delimited() {
        delimited::normalize(dataset)
    } else {
        dataset.clone()
    }
}
