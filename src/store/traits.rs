//! store::traits
//!
//! The `RemoteStore` trait and the request/response types it exchanges.
//!
//! # Design
//!
//! A store holds versioned blobs addressed by path. Every blob crosses the
//! trait base64-encoded, as it does on the GitHub contents API, and every
//! write is conditioned on the revision marker the writer last observed.
//!
//! Stores are async because fetch and push involve I/O. All methods return
//! `Result` so that callers can classify failures with [`StoreError::kind`].
//!
//! # Example
//!
//! ```ignore
//! use tabledit::core::types::StorePath;
//! use tabledit::store::{PushRequest, RemoteStore, StoreError};
//!
//! async fn touch(store: &dyn RemoteStore, path: &StorePath) -> Result<(), StoreError> {
//!     let fetched = store.fetch(path).await?;
//!     store
//!         .push(PushRequest {
//!             path: path.clone(),
//!             content: fetched.content,
//!             expected: Some(fetched.marker),
//!             message: "Rewrite unchanged".to_string(),
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::codec::EncodedBlob;
use crate::core::types::{ErrorKind, RevisionMarker, StorePath};

/// Errors from store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// No credentials are configured for a store that needs them.
    #[error("authentication required")]
    AuthRequired,

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Credentials are valid but may not perform this operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The path (or the repository or branch holding it) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote revision no longer matches the expected marker.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with an unexpected status or body.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Local storage failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// No store is configured.
    #[error("store unavailable: {0}")]
    Disabled(String),
}

impl StoreError {
    /// Classify the error.
    ///
    /// # Example
    ///
    /// ```
    /// use tabledit::core::types::ErrorKind;
    /// use tabledit::store::StoreError;
    ///
    /// assert_eq!(StoreError::RateLimited.kind(), ErrorKind::Transport);
    /// assert_eq!(StoreError::Conflict("sha".into()).kind(), ErrorKind::Conflict);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::AuthRequired | StoreError::AuthFailed(_) => ErrorKind::Auth,
            StoreError::PermissionDenied(_) => ErrorKind::Permission,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::RateLimited
            | StoreError::Network(_)
            | StoreError::Api { .. }
            | StoreError::Io(_) => ErrorKind::Transport,
            StoreError::Disabled(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Network failures, rate limits and server errors are retryable. Client
    /// errors reported by the API are not, even though they classify as
    /// transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_) | StoreError::RateLimited => true,
            StoreError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the request may have reached the remote before failing.
    ///
    /// A push that fails this way has an unknown outcome.
    pub fn outcome_unknown(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A blob read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBlob {
    /// Base64 content
    pub content: EncodedBlob,
    /// Revision the content was read at
    pub marker: RevisionMarker,
}

/// A conditional write.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest {
    /// Destination path
    pub path: StorePath,
    /// Base64 content
    pub content: EncodedBlob,
    /// Revision the writer last observed; `None` means the path must not exist
    pub expected: Option<RevisionMarker>,
    /// Commit message
    pub message: String,
}

/// The revision created by a successful push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushReceipt {
    /// Marker of the new content
    pub marker: RevisionMarker,
    /// Commit that recorded the write, for stores that keep history
    pub commit: Option<CommitInfo>,
}

/// A commit in the remote's history.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// Commit id
    pub id: String,
    /// Web URL for viewing the commit
    pub url: Option<String>,
}

/// A versioned blob store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Callers should handle:
/// - `Conflict`: reload before trying again, never retry as is
/// - `AuthRequired` / `AuthFailed`: configure credentials
/// - `RateLimited` / `Network` / 5xx `Api`: back off and retry
/// - `NotFound` / `PermissionDenied`: check the configured location
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Get the store name (e.g., "github", "local").
    fn name(&self) -> &'static str;

    /// Read the current content of `path`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing exists at `path`
    /// - `AuthRequired` / `AuthFailed` if credentials are missing or rejected
    /// - `Network` / `RateLimited` on transport failure
    async fn fetch(&self, path: &StorePath) -> Result<FetchedBlob, StoreError>;

    /// Write new content, creating a new revision.
    ///
    /// The write is atomic and applies only if the current revision matches
    /// `request.expected`.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the remote moved past `expected`, or if `expected`
    ///   is `None` and the path already exists
    /// - `PermissionDenied` if the credentials cannot write
    /// - `Network` / `RateLimited` on transport failure
    async fn push(&self, request: PushRequest) -> Result<PushReceipt, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(StoreError::AuthRequired.kind(), ErrorKind::Auth);
        assert_eq!(StoreError::AuthFailed("x".into()).kind(), ErrorKind::Auth);
        assert_eq!(
            StoreError::PermissionDenied("x".into()).kind(),
            ErrorKind::Permission
        );
        assert_eq!(StoreError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(StoreError::Network("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(
            StoreError::Disabled("x".into()).kind(),
            ErrorKind::Unavailable
        );
    }

    #[test]
    fn retryable() {
        assert!(StoreError::Network("reset".into()).is_retryable());
        assert!(StoreError::RateLimited.is_retryable());
        assert!(StoreError::Api {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(!StoreError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!StoreError::Conflict("sha".into()).is_retryable());
        assert!(!StoreError::AuthFailed("expired".into()).is_retryable());
    }

    #[test]
    fn outcome_unknown_only_after_transport_failures() {
        assert!(StoreError::Network("timeout".into()).outcome_unknown());
        assert!(StoreError::Api {
            status: 500,
            message: "oops".into()
        }
        .outcome_unknown());
        assert!(!StoreError::RateLimited.outcome_unknown());
        assert!(!StoreError::Conflict("sha".into()).outcome_unknown());
    }

    #[test]
    fn display() {
        assert_eq!(
            StoreError::AuthRequired.to_string(),
            "authentication required"
        );
        assert_eq!(
            StoreError::Api {
                status: 422,
                message: "Invalid request".into()
            }
            .to_string(),
            "API error: 422 - Invalid request"
        );
        assert_eq!(
            StoreError::Disabled("no store configured".into()).to_string(),
            "store unavailable: no store configured"
        );
    }
}
