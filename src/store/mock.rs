//! store::mock
//!
//! In-memory store for deterministic testing.
//!
//! # Design
//!
//! The mock keeps blobs in memory and hands out sequential revision markers
//! (`M1`, `M2`, ...), so tests can assert on exact markers. Failures are
//! injected with [`FailOn`], either permanently or for a fixed number of
//! calls, and every call is recorded as a [`MockOperation`].
//!
//! Clones share state, so a test can keep one handle for inspection while a
//! pipeline owns another, and can simulate a second writer with
//! [`MockStore::write_out_of_band`].
//!
//! # Example
//!
//! ```
//! use tabledit::core::codec;
//! use tabledit::core::types::{RevisionMarker, StorePath};
//! use tabledit::store::mock::MockStore;
//! use tabledit::store::{PushRequest, RemoteStore};
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new().with_file("data.csv", b"id\n1\n");
//! let path = StorePath::new("data.csv").unwrap();
//!
//! let fetched = store.fetch(&path).await.unwrap();
//! assert_eq!(fetched.marker, RevisionMarker::new("M1"));
//!
//! let receipt = store
//!     .push(PushRequest {
//!         path: path.clone(),
//!         content: codec::encode(b"id\n2\n"),
//!         expected: Some(fetched.marker),
//!         message: "Update".to_string(),
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(receipt.marker, RevisionMarker::new("M2"));
//! assert_eq!(store.content("data.csv").unwrap(), b"id\n2\n");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::traits::{CommitInfo, FetchedBlob, PushReceipt, PushRequest, RemoteStore, StoreError};
use crate::core::codec::{self, EncodedBlob};
use crate::core::types::{RevisionMarker, StorePath};

/// Mock store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    /// Current blob and marker by path.
    blobs: HashMap<String, (EncodedBlob, RevisionMarker)>,
    /// Last revision number handed out.
    revision: u64,
    /// Injected failures with their remaining count (`None` = forever).
    failures: Vec<(FailOn, Option<usize>)>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

impl MockStoreInner {
    fn next_marker(&mut self) -> RevisionMarker {
        self.revision += 1;
        RevisionMarker::new(format!("M{}", self.revision))
    }

    /// Take the first matching failure, consuming one use of it.
    fn take_failure(&mut self, matches: impl Fn(&FailOn) -> bool) -> Option<FailOn> {
        let idx = self.failures.iter().position(|(f, _)| matches(f))?;
        let (fail, remaining) = &mut self.failures[idx];
        let fail = fail.clone();
        if let Some(n) = remaining {
            *n -= 1;
            if *n == 0 {
                self.failures.remove(idx);
            }
        }
        Some(fail)
    }
}

/// Which operation should fail, and how.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail fetch with the given error.
    Fetch(StoreError),
    /// Fail push with the given error before writing.
    Push(StoreError),
    /// Perform the write, then report the given error.
    ///
    /// Simulates a response lost after the remote committed.
    PushAfterWrite(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    Fetch {
        path: String,
    },
    Push {
        path: String,
        expected: Option<RevisionMarker>,
        message: String,
        content: EncodedBlob,
    },
}

impl MockStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with the next sequential marker.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid store path. Intended for test setup.
    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        {
            let mut inner = self.lock();
            let marker = inner.next_marker();
            inner
                .blobs
                .insert(checked(path), (codec::encode(content), marker));
        }
        self
    }

    /// Seed a file with an explicit marker.
    pub fn with_file_at(self, path: &str, content: &[u8], marker: &str) -> Self {
        self.lock().blobs.insert(
            checked(path),
            (codec::encode(content), RevisionMarker::new(marker)),
        );
        self
    }

    /// Configure an operation to fail on every call.
    ///
    /// # Example
    ///
    /// ```
    /// use tabledit::store::mock::{FailOn, MockStore};
    /// use tabledit::store::StoreError;
    ///
    /// let store = MockStore::new().fail_on(FailOn::Push(StoreError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().failures.push((fail_on, None));
        self
    }

    /// Configure an operation to fail on the next `times` calls only.
    pub fn fail_times(self, fail_on: FailOn, times: usize) -> Self {
        if times > 0 {
            self.lock().failures.push((fail_on, Some(times)));
        }
        self
    }

    /// Clear all failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().failures.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Number of push calls recorded.
    pub fn push_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::Push { .. }))
            .count()
    }

    /// Decoded content at `path` (for test verification).
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.lock();
        let (blob, _) = inner.blobs.get(path)?;
        codec::decode(blob).ok()
    }

    /// Current marker at `path` (for test verification).
    pub fn marker(&self, path: &str) -> Option<RevisionMarker> {
        self.lock().blobs.get(path).map(|(_, m)| m.clone())
    }

    /// Replace the content at `path` as another writer would.
    pub fn write_out_of_band(&self, path: &str, content: &[u8]) -> RevisionMarker {
        let mut inner = self.lock();
        let marker = inner.next_marker();
        inner
            .blobs
            .insert(checked(path), (codec::encode(content), marker.clone()));
        marker
    }

    fn lock(&self) -> MutexGuard<'_, MockStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }
}

fn checked(path: &str) -> String {
    match StorePath::new(path) {
        Ok(p) => p.to_string(),
        Err(e) => panic!("invalid mock path: {}", e),
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, path: &StorePath) -> Result<FetchedBlob, StoreError> {
        self.record(MockOperation::Fetch {
            path: path.to_string(),
        });

        let mut inner = self.lock();
        if let Some(FailOn::Fetch(e)) = inner.take_failure(|f| matches!(f, FailOn::Fetch(_))) {
            return Err(e);
        }

        inner
            .blobs
            .get(path.as_str())
            .map(|(content, marker)| FetchedBlob {
                content: content.clone(),
                marker: marker.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn push(&self, request: PushRequest) -> Result<PushReceipt, StoreError> {
        self.record(MockOperation::Push {
            path: request.path.to_string(),
            expected: request.expected.clone(),
            message: request.message.clone(),
            content: request.content.clone(),
        });

        let mut inner = self.lock();
        let injected = inner.take_failure(|f| matches!(f, FailOn::Push(_) | FailOn::PushAfterWrite(_)));
        let after_write = match injected {
            Some(FailOn::Push(e)) => return Err(e),
            Some(FailOn::PushAfterWrite(e)) => Some(e),
            _ => None,
        };

        let current = inner.blobs.get(request.path.as_str()).map(|(_, m)| m);
        match (&request.expected, current) {
            (None, Some(_)) => {
                return Err(StoreError::Conflict(format!(
                    "{} already exists",
                    request.path
                )))
            }
            (Some(expected), None) => {
                return Err(StoreError::Conflict(format!(
                    "{} no longer exists (expected {})",
                    request.path, expected
                )))
            }
            (Some(expected), Some(current)) if expected != current => {
                return Err(StoreError::Conflict(format!(
                    "{} is at {}, expected {}",
                    request.path, current, expected
                )))
            }
            _ => {}
        }

        let marker = inner.next_marker();
        let commit = CommitInfo {
            id: format!("commit-{}", inner.revision),
            url: None,
        };
        inner.blobs.insert(
            request.path.to_string(),
            (request.content, marker.clone()),
        );

        match after_write {
            Some(e) => Err(e),
            None => Ok(PushReceipt {
                marker,
                commit: Some(commit),
            }),
        }
    }
}
