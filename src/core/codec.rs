//! core::codec
//!
//! Transport encoding for file blobs.
//!
//! Remote stores move file content as base64 text inside JSON payloads.
//! This module converts between raw bytes and that representation.
//!
//! # Invariants
//!
//! - `decode(&encode(x)) == x` for every byte sequence, including empty
//!   input and non-UTF-8 content
//! - Decoding accepts CR/LF line wrapping (GitHub wraps content at 60
//!   columns) and rejects every other character outside the standard
//!   alphabet, as well as non-canonical padding
//!
//! # Example
//!
//! ```
//! use tabledit::core::codec::{decode, encode};
//!
//! let blob = encode(b"id,val\n1,10\n");
//! assert_eq!(blob.as_str(), "aWQsdmFsCjEsMTAK");
//! assert_eq!(decode(&blob).unwrap(), b"id,val\n1,10\n");
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding transport content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A byte outside the base64 alphabet.
    #[error("invalid base64 character {byte:#04x} at offset {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },

    /// Missing, excess or misplaced `=` padding, or a truncated final block.
    #[error("invalid base64 padding: {0}")]
    InvalidPadding(String),
}

/// Base64 text as carried by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBlob(String);

impl EncodedBlob {
    /// Wrap transport text received from a store.
    ///
    /// The text is not validated until it is decoded.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the transport text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the blob, returning the transport text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Encode raw bytes for transport.
pub fn encode(raw: &[u8]) -> EncodedBlob {
    EncodedBlob(STANDARD.encode(raw))
}

/// Decode transport text back to raw bytes.
///
/// # Errors
///
/// Returns `CodecError` on characters outside the alphabet or bad padding.
pub fn decode(blob: &EncodedBlob) -> Result<Vec<u8>, CodecError> {
    let compact: Vec<u8> = blob
        .0
        .bytes()
        .filter(|b| *b != b'\n' && *b != b'\r')
        .collect();

    STANDARD.decode(&compact).map_err(|e| match e {
        base64::DecodeError::InvalidByte(offset, byte) if byte == b'=' => {
            CodecError::InvalidPadding(format!("unexpected '=' at offset {}", offset))
        }
        base64::DecodeError::InvalidByte(offset, byte) => {
            CodecError::InvalidCharacter { offset, byte }
        }
        base64::DecodeError::InvalidLength => {
            CodecError::InvalidPadding("input length is not a multiple of 4".into())
        }
        base64::DecodeError::InvalidLastSymbol(offset, byte) => {
            CodecError::InvalidCharacter { offset, byte }
        }
        base64::DecodeError::InvalidPadding => {
            CodecError::InvalidPadding("padding is missing or not canonical".into())
        }
    })
}
