//! pipeline
//!
//! Fetch, edit and publish one dataset file through a [`RemoteStore`].
//!
//! # Architecture
//!
//! ```text
//! fetch -> decode -> parse -> EditSession -> serialize -> encode -> push
//! ```
//!
//! A [`PublishPipeline`] owns one lifecycle at a time: the path, the format,
//! the revision marker of the last successful fetch or push, and the
//! [`EditSession`] holding the working copy. Every push is conditioned on
//! that marker, so a remote that moved on is reported as a conflict and
//! never overwritten.
//!
//! # Invariants
//!
//! - Conflicts are never retried and never merged; the caller reloads
//! - Only retryable store failures are retried, per [`RetryPolicy`]
//! - A push whose outcome is unknown is reconciled by re-reading the remote
//!   once; a remote holding exactly the pushed bytes counts as published
//! - Cancellation is honoured only before a push request is issued
//! - Local failures (validation, serialisation) leave the state unchanged
//!
//! # Concurrency
//!
//! Mutating methods take `&mut self`. Callers that share a pipeline across
//! tasks wrap it in a mutex; the [`CancelHandle`] is the one piece meant to
//! be used from elsewhere.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tabledit::core::types::StorePath;
//! use tabledit::dataset::Value;
//! use tabledit::pipeline::{PublishPipeline, PublishResult};
//! use tabledit::session::EditOperation;
//! use tabledit::store::mock::MockStore;
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new().with_file("data.csv", b"id,val\n1,10\n2,20\n");
//! let mut pipeline = PublishPipeline::new(Arc::new(store.clone()));
//!
//! pipeline.load(StorePath::new("data.csv").unwrap()).await.unwrap();
//! pipeline
//!     .apply(EditOperation::set_cell(0, "val", Value::Integer(99)))
//!     .unwrap();
//!
//! assert!(pipeline.publish("Update val").await.is_published());
//! assert_eq!(store.content("data.csv").unwrap(), b"id,val\n1,99\n2,20\n");
//! assert_eq!(pipeline.publish("Again").await, PublishResult::NothingToPublish);
//! # });
//! ```

mod retry;
mod state;

pub use retry::RetryPolicy;
pub use state::{PipelineState, PublishReceipt, PublishResult};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::codec::{self, CodecError};
use crate::core::types::{ErrorKind, RevisionMarker, StorePath};
use crate::dataset::{self, Dataset, Format, FormatError};
use crate::session::{EditOperation, EditSession, ValidationError};
use crate::store::{CommitInfo, FetchedBlob, PushRequest, RemoteStore, StoreError};

/// Errors from pipeline operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot tell the format of '{0}' from its extension")]
    UnknownFormat(StorePath),

    #[error("nothing is loaded")]
    NotLoaded,
}

impl PipelineError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Store(e) => e.kind(),
            PipelineError::Codec(_) => ErrorKind::Encoding,
            PipelineError::Format(_) | PipelineError::UnknownFormat(_) => ErrorKind::Format,
            PipelineError::Validation(_) | PipelineError::NotLoaded => ErrorKind::Validation,
        }
    }
}

/// Requests cancellation of an in-progress publish.
///
/// Clones share one flag. A cancel takes effect at the next point where the
/// pipeline is about to issue a push; a push already sent is never
/// abandoned. Starting a new lifecycle clears a pending cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// An operation [`PublishPipeline::reapply`] could not apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEdit {
    pub operation: EditOperation,
    pub error: PipelineError,
}

/// The file a lifecycle is bound to and its working copy.
#[derive(Debug)]
struct Working {
    path: StorePath,
    format: Format,
    /// `None` until a file created by this pipeline is first published.
    marker: Option<RevisionMarker>,
    session: EditSession,
}

/// Fetch-edit-publish state machine for one dataset file.
pub struct PublishPipeline {
    store: Arc<dyn RemoteStore>,
    retry: RetryPolicy,
    state: PipelineState,
    working: Option<Working>,
    last_error: Option<PipelineError>,
    cancel: CancelHandle,
    id: Uuid,
}

impl std::fmt::Debug for PublishPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishPipeline")
            .field("id", &self.id)
            .field("store", &self.store.name())
            .field("state", &self.state)
            .field("path", &self.path())
            .field("marker", &self.marker())
            .finish()
    }
}

impl PublishPipeline {
    /// Create an idle pipeline over `store` with the default retry policy.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            state: PipelineState::Idle,
            working: None,
            last_error: None,
            cancel: CancelHandle::default(),
            id: Uuid::new_v4(),
        }
    }

    /// Use `policy` for retryable store failures.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Load `path`, selecting the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::UnknownFormat` if the extension names no
    /// supported format, otherwise as [`load_as`](Self::load_as).
    pub async fn load(&mut self, path: StorePath) -> Result<(), PipelineError> {
        match Format::from_path(&path) {
            Some(format) => self.load_as(path, format).await,
            None => {
                self.working = None;
                Err(self.fail(PipelineError::UnknownFormat(path)))
            }
        }
    }

    /// Load `path` as `format`, starting a new lifecycle.
    ///
    /// Any previous working copy is discarded.
    ///
    /// # Errors
    ///
    /// Store, codec and format errors. The pipeline moves to `Failed` with
    /// the error's kind.
    #[tracing::instrument(skip_all, fields(pipeline = %self.id, path = %path, format = %format))]
    pub async fn load_as(&mut self, path: StorePath, format: Format) -> Result<(), PipelineError> {
        self.working = None;
        self.cancel.clear();

        match self.fetch_dataset(&path, format).await {
            Ok((dataset, marker)) => {
                info!(marker = %marker.short(), rows = dataset.row_count(), "loaded");
                self.begin(path, format, Some(marker), EditSession::new(dataset, format));
                self.state = PipelineState::Loaded;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Start a lifecycle for a file that does not exist yet.
    ///
    /// The first publish performs a create-only push, which conflicts if
    /// the path appeared in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidColumns` for an empty, blank or
    /// duplicated column list, and `UnknownFormat` when no format is given
    /// and the extension names none. The pipeline is unchanged on error.
    pub fn create(
        &mut self,
        path: StorePath,
        columns: Vec<String>,
        format: Option<Format>,
    ) -> Result<(), PipelineError> {
        let format = format
            .or_else(|| Format::from_path(&path))
            .ok_or_else(|| PipelineError::UnknownFormat(path.clone()))?;
        check_columns(&columns)?;

        self.cancel.clear();
        debug!(pipeline = %self.id, path = %path, columns = columns.len(), "created");
        let session = EditSession::unsaved(Dataset::with_columns(columns), format);
        self.begin(path, format, None, session);
        self.state = PipelineState::Editing;
        Ok(())
    }

    /// Apply one edit to the working copy.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotEditable` outside `Loaded` and
    /// `Editing`, and the session's `ValidationError` for an invalid edit.
    /// Neither changes the state or the dataset.
    pub fn apply(&mut self, op: EditOperation) -> Result<(), PipelineError> {
        if !self.state.accepts_edits() {
            return Err(ValidationError::NotEditable(self.state.name().to_string()).into());
        }
        let working = self.working.as_mut().ok_or(PipelineError::NotLoaded)?;
        working.session.apply(op)?;
        self.state = PipelineState::Editing;
        Ok(())
    }

    /// Apply each operation in order, returning the ones that no longer fit.
    pub fn reapply(&mut self, ops: impl IntoIterator<Item = EditOperation>) -> Vec<RejectedEdit> {
        let mut rejected = Vec::new();
        for op in ops {
            if let Err(error) = self.apply(op.clone()) {
                debug!(pipeline = %self.id, op = %op, error = %error, "edit rejected on reapply");
                rejected.push(RejectedEdit {
                    operation: op,
                    error,
                });
            }
        }
        rejected
    }

    /// Publish the working copy.
    ///
    /// See the module documentation for retry, conflict and reconciliation
    /// behaviour. Failures are reported in the result and reflected in
    /// [`state`](Self::state); nothing is returned as `Err`.
    #[tracing::instrument(skip_all, fields(pipeline = %self.id))]
    pub async fn publish(&mut self, message: &str) -> PublishResult {
        match &self.state {
            PipelineState::Conflicted { expected, message } => {
                return PublishResult::Conflicted {
                    expected: expected.clone(),
                    message: message.clone(),
                }
            }
            state if !state.accepts_edits() => {
                return PublishResult::Failed {
                    kind: ErrorKind::Validation,
                    message: format!("nothing to publish: pipeline is {}", state.name()),
                }
            }
            _ => {}
        }

        let Some(working) = self.working.as_ref() else {
            return PublishResult::Failed {
                kind: ErrorKind::Validation,
                message: PipelineError::NotLoaded.to_string(),
            };
        };
        if !working.session.is_dirty() {
            debug!("no edits since last publish");
            return PublishResult::NothingToPublish;
        }

        let raw = match dataset::serialize(working.session.dataset(), working.format) {
            Ok(raw) => raw,
            Err(e) => {
                return PublishResult::Failed {
                    kind: ErrorKind::Format,
                    message: e.to_string(),
                }
            }
        };
        let request = PushRequest {
            path: working.path.clone(),
            content: codec::encode(&raw),
            expected: working.marker.clone(),
            message: message.to_string(),
        };

        self.state = PipelineState::Publishing;
        let mut attempt = 0;
        let mut outcome_unknown = false;
        let error = loop {
            if self.cancel.take() {
                info!(attempt, "publish cancelled before push");
                self.state = PipelineState::Editing;
                return PublishResult::Cancelled;
            }

            debug!(
                attempt,
                path = %request.path,
                expected = request.expected.as_ref().map(|m| m.short()).unwrap_or("none"),
                bytes = raw.len(),
                "pushing"
            );
            match self.store.push(request.clone()).await {
                Ok(receipt) => return self.published(receipt.marker, receipt.commit, false),
                Err(e) => {
                    outcome_unknown |= e.outcome_unknown();
                    if e.is_retryable() && self.retry.allows_retry(attempt) {
                        let delay = self.retry.delay_for(attempt);
                        debug!(attempt, ?delay, error = %e, "push failed, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    break e;
                }
            }
        };

        if outcome_unknown {
            if let Some(result) = self.reconcile(&request.path, &raw).await {
                return result;
            }
        }

        match error {
            StoreError::Conflict(message) => {
                warn!(
                    expected = request.expected.as_ref().map(|m| m.short()).unwrap_or("none"),
                    %message,
                    "publish conflicted"
                );
                self.last_error = Some(StoreError::Conflict(message.clone()).into());
                self.state = PipelineState::Conflicted {
                    expected: request.expected.clone(),
                    message: message.clone(),
                };
                PublishResult::Conflicted {
                    expected: request.expected,
                    message,
                }
            }
            other => {
                let err = self.fail(other.into());
                PublishResult::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// Re-fetch the current path, discarding the working copy.
    ///
    /// Returns the operations applied since the last load or publish so the
    /// caller can decide whether to [`reapply`](Self::reapply) them.
    ///
    /// # Errors
    ///
    /// `NotLoaded` if no lifecycle was started. Fetch failures move the
    /// pipeline to `Failed` and keep the working copy.
    #[tracing::instrument(skip_all, fields(pipeline = %self.id))]
    pub async fn reload(&mut self) -> Result<Vec<EditOperation>, PipelineError> {
        let (path, format) = match &self.working {
            Some(working) => (working.path.clone(), working.format),
            None => return Err(PipelineError::NotLoaded),
        };
        self.cancel.clear();

        match self.fetch_dataset(&path, format).await {
            Ok((dataset, marker)) => {
                let discarded = self
                    .working
                    .take()
                    .map(|w| w.session.into_applied())
                    .unwrap_or_default();
                info!(
                    path = %path,
                    marker = %marker.short(),
                    discarded = discarded.len(),
                    "reloaded"
                );
                self.begin(path, format, Some(marker), EditSession::new(dataset, format));
                self.state = PipelineState::Loaded;
                Ok(discarded)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// A handle that can cancel a publish from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Read-only view of the working copy.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.working.as_ref().map(|w| w.session.dataset())
    }

    pub fn marker(&self) -> Option<&RevisionMarker> {
        self.working.as_ref().and_then(|w| w.marker.as_ref())
    }

    pub fn path(&self) -> Option<&StorePath> {
        self.working.as_ref().map(|w| &w.path)
    }

    pub fn format(&self) -> Option<Format> {
        self.working.as_ref().map(|w| w.format)
    }

    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.working
            .as_ref()
            .map(|w| w.session.is_dirty())
            .unwrap_or(false)
    }

    /// Edits applied since the last load or publish.
    pub fn pending_edits(&self) -> &[EditOperation] {
        self.working
            .as_ref()
            .map(|w| w.session.applied())
            .unwrap_or(&[])
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    fn begin(
        &mut self,
        path: StorePath,
        format: Format,
        marker: Option<RevisionMarker>,
        session: EditSession,
    ) {
        self.working = Some(Working {
            path,
            format,
            marker,
            session,
        });
        self.last_error = None;
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        warn!(pipeline = %self.id, kind = %err.kind(), error = %err, "pipeline failed");
        self.state = PipelineState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        };
        self.last_error = Some(err.clone());
        err
    }

    fn published(
        &mut self,
        marker: RevisionMarker,
        commit: Option<CommitInfo>,
        reconciled: bool,
    ) -> PublishResult {
        if let Some(working) = self.working.as_mut() {
            working.marker = Some(marker.clone());
            working.session.mark_clean();
        }
        self.state = PipelineState::Loaded;
        self.last_error = None;
        info!(marker = %marker.short(), reconciled, "published");

        PublishResult::Published(PublishReceipt {
            marker,
            commit,
            published_at: Utc::now(),
            reconciled,
        })
    }

    /// Settle a push whose outcome is unknown by reading the remote back.
    async fn reconcile(&mut self, path: &StorePath, pushed: &[u8]) -> Option<PublishResult> {
        let fetched = match self.store.fetch(path).await {
            Ok(fetched) => fetched,
            Err(e) => {
                debug!(error = %e, "reconcile fetch failed");
                return None;
            }
        };

        match codec::decode(&fetched.content) {
            Ok(remote) if remote == pushed => {
                warn!(
                    marker = %fetched.marker.short(),
                    "push outcome was unknown; remote holds the published content"
                );
                Some(self.published(fetched.marker, None, true))
            }
            _ => None,
        }
    }

    async fn fetch_dataset(
        &self,
        path: &StorePath,
        format: Format,
    ) -> Result<(Dataset, RevisionMarker), PipelineError> {
        let fetched = self.fetch_with_retry(path).await?;
        let raw = codec::decode(&fetched.content)?;
        let dataset = dataset::parse(&raw, format)?;
        Ok((dataset, fetched.marker))
    }

    async fn fetch_with_retry(&self, path: &StorePath) -> Result<FetchedBlob, StoreError> {
        let mut attempt = 0;
        loop {
            match self.store.fetch(path).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_retryable() && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(attempt, ?delay, error = %e, "fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn check_columns(columns: &[String]) -> Result<(), ValidationError> {
    if columns.is_empty() {
        return Err(ValidationError::InvalidColumns("no columns given".into()));
    }
    for (idx, name) in columns.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidColumns(format!(
                "column {} has an empty name",
                idx + 1
            )));
        }
        if columns[..idx].contains(name) {
            return Err(ValidationError::InvalidColumns(format!(
                "duplicate column '{}'",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use crate::store::mock::{FailOn, MockStore};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 1,
        }
    }

    fn path(s: &str) -> StorePath {
        StorePath::new(s).unwrap()
    }

    async fn loaded(store: &MockStore) -> PublishPipeline {
        let mut pipeline = PublishPipeline::new(Arc::new(store.clone())).with_retry(fast());
        pipeline.load(path("data.csv")).await.unwrap();
        pipeline
    }

    mod load {
        use super::*;

        #[tokio::test]
        async fn sets_loaded_state_and_marker() {
            let store = MockStore::new().with_file("data.csv", b"id\n1\n");
            let pipeline = loaded(&store).await;
            assert_eq!(pipeline.state(), &PipelineState::Loaded);
            assert_eq!(pipeline.marker().unwrap().as_str(), "M1");
            assert_eq!(pipeline.dataset().unwrap().row_count(), 1);
            assert!(!pipeline.is_dirty());
        }

        #[tokio::test]
        async fn unknown_extension_fails_with_format_kind() {
            let store = MockStore::new().with_file("notes.txt", b"hi");
            let mut pipeline = PublishPipeline::new(Arc::new(store));
            let err = pipeline.load(path("notes.txt")).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format);
            assert!(matches!(
                pipeline.state(),
                PipelineState::Failed {
                    kind: ErrorKind::Format,
                    ..
                }
            ));
        }

        #[tokio::test]
        async fn not_found_is_not_retried() {
            let store = MockStore::new();
            let mut pipeline = PublishPipeline::new(Arc::new(store.clone())).with_retry(fast());
            let err = pipeline.load(path("data.csv")).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(store.operations().len(), 1);
        }

        #[tokio::test]
        async fn transport_errors_are_retried() {
            let store = MockStore::new()
                .with_file("data.csv", b"id\n1\n")
                .fail_times(FailOn::Fetch(StoreError::Network("reset".into())), 2);
            let pipeline = loaded(&store).await;
            assert_eq!(pipeline.state(), &PipelineState::Loaded);
            assert_eq!(store.operations().len(), 3);
        }

        #[tokio::test]
        async fn malformed_content_fails_with_location() {
            let store = MockStore::new().with_file("data.csv", b"a,b\n1,2,3\n");
            let mut pipeline = PublishPipeline::new(Arc::new(store));
            let err = pipeline.load(path("data.csv")).await.unwrap_err();
            match err {
                PipelineError::Format(e) => assert_eq!(e.line, Some(2)),
                other => panic!("expected format error, got {:?}", other),
            }
        }
    }

    mod apply {
        use super::*;

        #[tokio::test]
        async fn moves_to_editing() {
            let store = MockStore::new().with_file("data.csv", b"id\n1\n");
            let mut pipeline = loaded(&store).await;
            pipeline
                .apply(EditOperation::set_cell(0, "id", Value::Integer(2)))
                .unwrap();
            assert_eq!(pipeline.state(), &PipelineState::Editing);
            assert_eq!(pipeline.pending_edits().len(), 1);
        }

        #[tokio::test]
        async fn invalid_edit_keeps_state() {
            let store = MockStore::new().with_file("data.csv", b"id\n1\n");
            let mut pipeline = loaded(&store).await;
            let err = pipeline.apply(EditOperation::delete_row(5)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(pipeline.state(), &PipelineState::Loaded);
        }

        #[test]
        fn rejected_when_idle() {
            let mut pipeline = PublishPipeline::new(Arc::new(MockStore::new()));
            let err = pipeline.apply(EditOperation::delete_row(0)).unwrap_err();
            assert_eq!(
                err,
                PipelineError::Validation(ValidationError::NotEditable("idle".into()))
            );
        }
    }

    mod publish {
        use super::*;

        #[tokio::test]
        async fn clean_session_sends_nothing() {
            let store = MockStore::new().with_file("data.csv", b"id\n1\n");
            let mut pipeline = loaded(&store).await;
            assert_eq!(pipeline.publish("m").await, PublishResult::NothingToPublish);
            assert_eq!(store.push_count(), 0);
        }

        #[tokio::test]
        async fn auth_failure_is_not_retried() {
            let store = MockStore::new()
                .with_file("data.csv", b"id\n1\n")
                .fail_on(FailOn::Push(StoreError::AuthFailed("expired".into())));
            let mut pipeline = loaded(&store).await;
            pipeline.apply(EditOperation::delete_row(0)).unwrap();

            let result = pipeline.publish("m").await;
            assert!(matches!(
                result,
                PublishResult::Failed {
                    kind: ErrorKind::Auth,
                    ..
                }
            ));
            assert_eq!(store.push_count(), 1);
            assert_eq!(pipeline.last_error().unwrap().kind(), ErrorKind::Auth);
        }

        #[tokio::test]
        async fn retries_are_bounded() {
            let store = MockStore::new()
                .with_file("data.csv", b"id\n1\n")
                .fail_on(FailOn::Push(StoreError::RateLimited));
            let mut pipeline = loaded(&store).await;
            pipeline.apply(EditOperation::delete_row(0)).unwrap();

            let result = pipeline.publish("m").await;
            assert!(matches!(
                result,
                PublishResult::Failed {
                    kind: ErrorKind::Transport,
                    ..
                }
            ));
            assert_eq!(store.push_count(), 3);
        }

        #[tokio::test]
        async fn cancelled_before_push() {
            let store = MockStore::new().with_file("data.csv", b"id\n1\n");
            let mut pipeline = loaded(&store).await;
            pipeline.apply(EditOperation::delete_row(0)).unwrap();

            pipeline.cancel_handle().cancel();
            assert_eq!(pipeline.publish("m").await, PublishResult::Cancelled);
            assert_eq!(pipeline.state(), &PipelineState::Editing);
            assert!(pipeline.is_dirty());
            assert_eq!(store.push_count(), 0);

            assert!(pipeline.publish("m").await.is_published());
        }

        #[tokio::test]
        async fn failed_state_rejects_publish_without_remote_call() {
            let store = MockStore::new();
            let mut pipeline = PublishPipeline::new(Arc::new(store.clone()));
            let _ = pipeline.load(path("data.csv")).await;
            let result = pipeline.publish("m").await;
            assert!(matches!(
                result,
                PublishResult::Failed {
                    kind: ErrorKind::Validation,
                    ..
                }
            ));
            assert_eq!(store.push_count(), 0);
        }
    }

    mod create {
        use super::*;

        #[tokio::test]
        async fn first_publish_is_create_only() {
            let store = MockStore::new();
            let mut pipeline = PublishPipeline::new(Arc::new(store.clone()));
            pipeline
                .create(path("new.csv"), vec!["id".into(), "name".into()], None)
                .unwrap();
            assert!(pipeline.is_dirty());
            assert!(pipeline.marker().is_none());

            assert!(pipeline.publish("Create").await.is_published());
            assert_eq!(store.content("new.csv").unwrap(), b"id,name\n");
            assert_eq!(pipeline.marker(), store.marker("new.csv").as_ref());
        }

        #[test]
        fn rejects_duplicate_columns() {
            let mut pipeline = PublishPipeline::new(Arc::new(MockStore::new()));
            let err = pipeline
                .create(path("new.csv"), vec!["a".into(), "a".into()], None)
                .unwrap_err();
            assert!(err.to_string().contains("duplicate column 'a'"));
            assert_eq!(pipeline.state(), &PipelineState::Idle);
        }

        #[test]
        fn explicit_format_overrides_extension() {
            let mut pipeline = PublishPipeline::new(Arc::new(MockStore::new()));
            pipeline
                .create(path("export"), vec!["a".into()], Some(Format::JsonLines))
                .unwrap();
            assert_eq!(pipeline.format(), Some(Format::JsonLines));
        }
    }

    #[test]
    fn debug_shows_store_name() {
        let pipeline = PublishPipeline::new(Arc::new(MockStore::new()));
        let debug = format!("{:?}", pipeline);
        assert!(debug.contains("mock"));
        assert!(debug.contains("Idle"));
    }
}
