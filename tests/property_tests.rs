//! Property-based tests for the codec, store paths and datasets.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use tabledit::core::codec::{self, EncodedBlob};
use tabledit::core::types::StorePath;
use tabledit::dataset::{self, Dataset, Format, Value};
use tabledit::session::{EditOperation, EditSession};

const BASE: &[u8] = b"id,name,score\n1,ada,9.5\n2,bob,7.25\n3,cy,8.0\n";

/// Strategy for a value of any kind, floats kept finite.
fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-zA-Z ,\"]{0,6}".prop_map(Value::Text),
    ]
}

fn column() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("id"), Just("name"), Just("score")]
}

/// Strategy for edits, including ones the session will reject.
fn operation() -> impl Strategy<Value = EditOperation> {
    prop_oneof![
        (0usize..6, column(), value())
            .prop_map(|(row, col, v)| EditOperation::set_cell(row, col, v)),
        (value(), value(), value()).prop_map(|(id, name, score)| {
            EditOperation::add_row([("id", id), ("name", name), ("score", score)])
        }),
        (0usize..6).prop_map(EditOperation::delete_row),
    ]
}

fn format() -> impl Strategy<Value = Format> {
    prop_oneof![
        Just(Format::Csv),
        Just(Format::Tsv),
        Just(Format::Json),
        Just(Format::JsonLines),
    ]
}

/// Strategy for a valid path component.
fn component() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-][a-zA-Z0-9_. -]{0,10}".prop_filter("not a dot component", |c| {
        c != "." && c != ".."
    })
}

fn edited_session(format: Format, ops: Vec<EditOperation>) -> EditSession {
    let base = dataset::parse(BASE, Format::Csv).unwrap();
    let base = dataset::parse(&dataset::serialize(&base, format).unwrap(), format).unwrap();
    let mut session = EditSession::new(base, format);
    for op in ops {
        let _ = session.apply(op);
    }
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn codec_round_trips_any_bytes(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let blob = codec::encode(&bytes);
        prop_assert_eq!(codec::decode(&blob).unwrap(), bytes);
    }

    #[test]
    fn codec_output_is_canonical(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let text = codec::encode(&bytes).into_inner();
        prop_assert_eq!(text.len() % 4, 0);
        prop_assert!(text.bytes().all(|b| b.is_ascii_alphanumeric() || b"+/=".contains(&b)));
    }

    #[test]
    fn codec_ignores_line_wrapping(
        bytes in prop::collection::vec(any::<u8>(), 1..512),
        width in 1usize..80,
    ) {
        let text = codec::encode(&bytes).into_inner();
        let wrapped: Vec<String> = text
            .as_bytes()
            .chunks(width)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        let blob = EncodedBlob::new(wrapped.join("\n") + "\n");
        prop_assert_eq!(codec::decode(&blob).unwrap(), bytes);
    }

    #[test]
    fn store_path_accepts_plain_relative_paths(
        parts in prop::collection::vec(component(), 1..5),
    ) {
        let joined = parts.join("/");
        let path = StorePath::new(joined.clone()).unwrap();
        prop_assert_eq!(path.as_str(), joined.as_str());
        prop_assert_eq!(path.file_name(), parts.last().unwrap().as_str());
    }

    #[test]
    fn store_path_rejects_parent_components(
        before in prop::collection::vec(component(), 0..3),
        after in prop::collection::vec(component(), 0..3),
    ) {
        let mut parts = before;
        parts.push("..".to_string());
        parts.extend(after);
        prop_assert!(StorePath::new(parts.join("/")).is_err());
    }

    #[test]
    fn any_finite_float_survives_record_formats(
        x in any::<f64>().prop_filter("finite", |x| x.is_finite()),
        format in prop_oneof![Just(Format::Json), Just(Format::JsonLines)],
    ) {
        let d = Dataset::from_rows(vec!["x".into()], vec![vec![Value::Float(x)]]).unwrap();
        let bytes = dataset::serialize(&d, format).unwrap();
        let reparsed = dataset::parse(&bytes, format).unwrap();
        match reparsed.cell(0, "x") {
            Some(Value::Float(y)) => prop_assert_eq!(y.to_bits(), x.to_bits()),
            other => prop_assert!(false, "expected a float, got {:?}", other),
        }
    }

    #[test]
    fn edited_dataset_survives_serialisation(
        format in format(),
        ops in prop::collection::vec(operation(), 0..12),
    ) {
        let session = edited_session(format, ops);
        let edited = session.dataset();

        let bytes = dataset::serialize(edited, format).unwrap();
        let reparsed = dataset::parse(&bytes, format).unwrap();
        if format.is_delimited() || edited.row_count() > 0 {
            prop_assert_eq!(&reparsed, edited);
        } else {
            // An emptied record file keeps no column names.
            prop_assert!(reparsed.columns().is_empty());
            prop_assert_eq!(reparsed.row_count(), 0);
        }
    }

    #[test]
    fn serialisation_is_deterministic(
        format in format(),
        ops in prop::collection::vec(operation(), 0..8),
    ) {
        let session = edited_session(format, ops);
        let first = dataset::serialize(session.dataset(), format).unwrap();
        let second = dataset::serialize(session.dataset(), format).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rejected_edits_leave_dataset_unchanged(
        ops in prop::collection::vec(operation(), 1..12),
    ) {
        let mut session = edited_session(Format::Csv, Vec::new());
        for op in ops {
            let before = session.dataset().clone();
            let applied = session.applied().len();
            if session.apply(op).is_err() {
                prop_assert_eq!(session.dataset(), &before);
                prop_assert_eq!(session.applied().len(), applied);
            }
        }
    }
}
