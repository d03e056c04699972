//! store::factory
//!
//! Store selection and creation.
//!
//! # Design
//!
//! Callers use [`create_store`] instead of naming a concrete store, so the
//! pipeline and CLI depend only on the [`RemoteStore`] trait. A configuration
//! with no remote resolves to [`DisabledStore`] rather than to an absent
//! client, and every operation on it reports
//! [`StoreError::Disabled`](super::StoreError::Disabled).
//!
//! # Example
//!
//! ```
//! use tabledit::store::{create_store, StoreSettings};
//!
//! let store = create_store(&StoreSettings::Disabled).unwrap();
//! assert_eq!(store.name(), "disabled");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use super::disabled::DisabledStore;
use super::github::GitHubStore;
use super::local::LocalStore;
use super::traits::{RemoteStore, StoreError};

/// Supported store providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreProvider {
    /// GitHub contents API
    GitHub,
    /// Local directory
    Local,
    /// No store
    Disabled,
}

impl StoreProvider {
    /// Get all providers.
    pub fn all() -> &'static [StoreProvider] {
        &[
            StoreProvider::GitHub,
            StoreProvider::Local,
            StoreProvider::Disabled,
        ]
    }

    /// Get the provider name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            StoreProvider::GitHub => "github",
            StoreProvider::Local => "local",
            StoreProvider::Disabled => "disabled",
        }
    }

    /// Parse a provider from a string (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use tabledit::store::StoreProvider;
    ///
    /// assert_eq!(StoreProvider::parse("GitHub"), Some(StoreProvider::GitHub));
    /// assert_eq!(StoreProvider::parse("s3"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(StoreProvider::GitHub),
            "local" => Some(StoreProvider::Local),
            "disabled" => Some(StoreProvider::Disabled),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything needed to construct a store.
#[derive(Clone, PartialEq)]
pub enum StoreSettings {
    GitHub {
        owner: String,
        repo: String,
        branch: Option<String>,
        api_base: Option<String>,
        token: Option<String>,
    },
    Local {
        root: PathBuf,
    },
    Disabled,
}

impl StoreSettings {
    pub fn provider(&self) -> StoreProvider {
        match self {
            StoreSettings::GitHub { .. } => StoreProvider::GitHub,
            StoreSettings::Local { .. } => StoreProvider::Local,
            StoreSettings::Disabled => StoreProvider::Disabled,
        }
    }
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreSettings::GitHub {
                owner,
                repo,
                branch,
                api_base,
                token,
            } => f
                .debug_struct("GitHub")
                .field("owner", owner)
                .field("repo", repo)
                .field("branch", branch)
                .field("api_base", api_base)
                .field("has_token", &token.is_some())
                .finish(),
            StoreSettings::Local { root } => f.debug_struct("Local").field("root", root).finish(),
            StoreSettings::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Create a store from settings.
///
/// # Errors
///
/// Returns `StoreError::Disabled` if GitHub settings name no owner or repo.
pub fn create_store(settings: &StoreSettings) -> Result<Arc<dyn RemoteStore>, StoreError> {
    tracing::debug!(provider = %settings.provider(), "creating store");
    match settings {
        StoreSettings::GitHub {
            owner,
            repo,
            branch,
            api_base,
            token,
        } => {
            if owner.is_empty() || repo.is_empty() {
                return Err(StoreError::Disabled(
                    "github store needs both owner and repo".into(),
                ));
            }
            let mut store = GitHubStore::new(owner.clone(), repo.clone());
            if let Some(token) = token {
                store = store.with_token(token.clone());
            }
            if let Some(branch) = branch {
                store = store.with_branch(branch.clone());
            }
            if let Some(api_base) = api_base {
                store = store.with_api_base(api_base.clone());
            }
            Ok(Arc::new(store))
        }
        StoreSettings::Local { root } => Ok(Arc::new(LocalStore::new(root.clone()))),
        StoreSettings::Disabled => Ok(Arc::new(DisabledStore::new())),
    }
}

/// Get list of valid store names for configuration validation.
pub fn valid_store_names() -> &'static [&'static str] {
    &["github", "local", "disabled"]
}
