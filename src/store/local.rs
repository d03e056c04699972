//! store::local
//!
//! Directory-backed store.
//!
//! # Design
//!
//! Paths resolve below a root directory. A file's revision marker is the
//! sha-256 of its current bytes, so any writer (including one outside this
//! crate) that changes the file moves the marker.
//!
//! # Invariants
//!
//! - The compare-and-write runs under an exclusive `fs2` lock on
//!   `<root>/.tabledit.lock`, so two pushes never interleave
//! - Content is written to a temp file in the target directory and renamed
//!   into place; readers see the old bytes or the new bytes, never a mix
//!
//! The store keeps no history, so receipts carry no commit.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use sha2::{Digest, Sha256};

use super::traits::{FetchedBlob, PushReceipt, PushRequest, RemoteStore, StoreError};
use crate::core::codec;
use crate::core::types::{RevisionMarker, StorePath};

/// Name of the lock file kept in the store root.
pub const LOCK_FILE: &str = ".tabledit.lock";

/// A store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created on first push.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &StorePath) -> PathBuf {
        self.root.join(path.as_str())
    }

    fn lock(&self) -> Result<RootLock, StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        let lock_path = self.root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_error(&lock_path, e))?;
        file.lock_exclusive().map_err(|e| io_error(&lock_path, e))?;
        Ok(RootLock { file })
    }

    fn write_locked(
        &self,
        request: &PushRequest,
        bytes: &[u8],
    ) -> Result<RevisionMarker, StoreError> {
        let target = self.resolve(&request.path);

        let current = match fs::read(&target) {
            Ok(existing) => Some(content_marker(&existing)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error(&target, e)),
        };

        match (&request.expected, &current) {
            (None, Some(_)) => {
                return Err(StoreError::Conflict(format!(
                    "{} already exists",
                    request.path
                )))
            }
            (Some(expected), None) => {
                return Err(StoreError::Conflict(format!(
                    "{} no longer exists (expected {})",
                    request.path,
                    expected.short()
                )))
            }
            (Some(expected), Some(current)) if expected != current => {
                return Err(StoreError::Conflict(format!(
                    "{} is at {}, expected {}",
                    request.path,
                    current.short(),
                    expected.short()
                )))
            }
            _ => {}
        }

        let dir = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let temp = dir.join(format!(
            ".{}.{}.tmp",
            request.path.file_name(),
            uuid::Uuid::new_v4().simple()
        ));
        let written = write_file(&temp, bytes).and_then(|()| fs::rename(&temp, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(io_error(&target, e));
        }

        Ok(content_marker(bytes))
    }
}

/// Held for the duration of a compare-and-write; unlocks on drop.
struct RootLock {
    file: File,
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Revision marker for a file's bytes.
pub fn content_marker(bytes: &[u8]) -> RevisionMarker {
    RevisionMarker::new(hex::encode(Sha256::digest(bytes)))
}

fn io_error(path: &Path, err: io::Error) -> StoreError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            StoreError::PermissionDenied(format!("{}: {}", path.display(), err))
        }
        _ => StoreError::Io(format!("{}: {}", path.display(), err)),
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, path: &StorePath) -> Result<FetchedBlob, StoreError> {
        let target = self.resolve(path);
        let bytes = match fs::read(&target) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => return Err(io_error(&target, e)),
        };

        tracing::debug!(path = %path, bytes = bytes.len(), "read local file");
        Ok(FetchedBlob {
            marker: content_marker(&bytes),
            content: codec::encode(&bytes),
        })
    }

    async fn push(&self, request: PushRequest) -> Result<PushReceipt, StoreError> {
        let bytes = codec::decode(&request.content)
            .map_err(|e| StoreError::Io(format!("cannot decode content: {}", e)))?;

        let _lock = self.lock()?;
        let marker = self.write_locked(&request, &bytes)?;

        tracing::debug!(path = %request.path, marker = %marker.short(), "wrote local file");
        Ok(PushReceipt {
            marker,
            commit: None,
        })
    }
}
