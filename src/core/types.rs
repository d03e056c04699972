//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`StorePath`] - Validated slash-separated path of a file in a store
//! - [`RevisionMarker`] - Opaque version token used for conditional writes
//! - [`ErrorKind`] - Classification shared by every error in the crate
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use tabledit::core::types::{RevisionMarker, StorePath};
//!
//! let path = StorePath::new("data/sales.csv").unwrap();
//! assert_eq!(path.extension(), Some("csv"));
//!
//! assert!(StorePath::new("../outside.csv").is_err());
//! assert!(StorePath::new("/absolute.csv").is_err());
//!
//! let marker = RevisionMarker::new("3a1f9c");
//! assert_eq!(marker.as_str(), "3a1f9c");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid store path: {0}")]
    InvalidPath(String),
}

/// A validated path of a file inside a store.
///
/// Paths are relative and slash-separated, the way the GitHub contents API
/// addresses files:
/// - Cannot be empty
/// - Cannot start or end with `/`
/// - Cannot contain empty, `.` or `..` components
/// - Cannot contain `\` or ASCII control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath(String);

impl StorePath {
    /// Create a new validated store path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path is not a plain relative path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        Self::validate(&path)?;
        Ok(Self(path))
    }

    fn validate(path: &str) -> Result<(), TypeError> {
        if path.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }
        if path.starts_with('/') || path.ends_with('/') {
            return Err(TypeError::InvalidPath(format!(
                "'{}' cannot start or end with '/'",
                path
            )));
        }
        if path.contains('\\') || path.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidPath(format!(
                "'{}' contains a backslash or control character",
                path
            )));
        }
        if path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(TypeError::InvalidPath(format!(
                "'{}' contains an empty, '.' or '..' component",
                path
            )));
        }
        Ok(())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final component of the path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The extension of the final component, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }
}

impl TryFrom<String> for StorePath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.0
    }
}

impl std::fmt::Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token identifying the version of a file at fetch time.
///
/// For GitHub this is the blob sha, for the local store a content hash.
/// Markers are only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMarker(String);

impl RevisionMarker {
    /// Wrap a store-issued version token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display (first 7 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of every failure the pipeline can report.
///
/// Callers decide on presentation from the kind alone. Only `Transport`
/// failures are candidates for automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure, timeout, rate limit or server error.
    Transport,
    /// Missing or rejected credentials.
    Auth,
    /// Credentials are valid but lack write access.
    Permission,
    /// The requested path does not exist.
    NotFound,
    /// The remote changed since the session's marker was obtained.
    Conflict,
    /// Malformed dataset content.
    Format,
    /// An edit or request that does not fit the dataset or the session state.
    Validation,
    /// Malformed transport encoding.
    Encoding,
    /// No remote store is configured.
    Unavailable,
}

impl ErrorKind {
    /// Whether an operation failing with this kind may succeed if repeated.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Auth => "auth",
            ErrorKind::Permission => "permission",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Format => "format",
            ErrorKind::Validation => "validation",
            ErrorKind::Encoding => "encoding",
            ErrorKind::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}
