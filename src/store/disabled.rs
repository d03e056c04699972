//! store::disabled
//!
//! The store used when no remote is configured.
//!
//! Every operation fails with [`StoreError::Disabled`], so a pipeline built
//! without a remote still loads and reports a classified failure instead of
//! needing a separate code path.

use async_trait::async_trait;

use super::traits::{FetchedBlob, PushReceipt, PushRequest, RemoteStore, StoreError};
use crate::core::types::StorePath;

const REASON: &str = "no store is configured (set store.provider)";

/// A store that refuses every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl DisabledStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteStore for DisabledStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn fetch(&self, _path: &StorePath) -> Result<FetchedBlob, StoreError> {
        Err(StoreError::Disabled(REASON.to_string()))
    }

    async fn push(&self, _request: PushRequest) -> Result<PushReceipt, StoreError> {
        Err(StoreError::Disabled(REASON.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec;
    use crate::core::types::ErrorKind;

    #[tokio::test]
    async fn every_operation_is_unavailable() {
        let store = DisabledStore::new();
        let path = StorePath::new("data.csv").unwrap();

        let err = store.fetch(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        let err = store
            .push(PushRequest {
                path,
                content: codec::encode(b""),
                expected: None,
                message: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Disabled(_)));
        assert!(!err.is_retryable());
    }
}
