//! secrets::traits
//!
//! Key-value interface for credentials.
//!
//! Keys are dotted names such as `github.pat`. Implementations never put a
//! secret value into a log line or an error message.

use thiserror::Error;

/// Errors from secret storage.
///
/// Messages name keys and paths, never values.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot read secrets: {0}")]
    Read(String),

    #[error("cannot write secrets: {0}")]
    Write(String),

    #[error("secrets file '{0}' is readable by other users (expected mode 0600)")]
    InsecurePermissions(String),

    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Storage for named secrets.
pub trait SecretStore: Send + Sync {
    /// Name of the provider, as used in configuration.
    fn provider(&self) -> &'static str;

    /// Look up `key`; `Ok(None)` when it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Remove `key`. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool, SecretError>;

    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}
