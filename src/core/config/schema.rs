//! core::config::schema
//!
//! Configuration schema types.
//!
//! The global file and the project file share one schema; the project
//! file overrides the global file field by field.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., provider must be a known store).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upper bound for `retry.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound for `retry.backoff_base_ms`.
pub const BACKOFF_BASE_LIMIT_MS: u64 = 60_000;

/// One configuration file (global or project scope).
///
/// # Example
///
/// ```toml
/// [store]
/// provider = "github"
/// owner = "acme"
/// repo = "datasets"
/// branch = "main"
///
/// [retry]
/// max_retries = 3
/// backoff_base_ms = 250
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Remote store selection
    pub store: Option<StoreConfig>,

    /// Retry policy for transport failures
    pub retry: Option<RetryConfig>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &ConfigFile) -> ConfigFile {
        ConfigFile {
            store: merge_section(&self.store, &other.store, StoreConfig::merged_with),
            retry: merge_section(&self.retry, &other.retry, RetryConfig::merged_with),
            secrets: merge_section(&self.secrets, &other.secrets, SecretsConfig::merged_with),
        }
    }
}

fn merge_section<T: Clone>(
    base: &Option<T>,
    over: &Option<T>,
    merge: impl Fn(&T, &T) -> T,
) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(merge(b, o)),
        (None, Some(o)) => Some(o.clone()),
        (b, None) => b.clone(),
    }
}

/// Remote store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Provider ("github", "local" or "disabled")
    pub provider: Option<String>,

    /// Repository owner (github)
    pub owner: Option<String>,

    /// Repository name (github)
    pub repo: Option<String>,

    /// Branch to read from and commit to (github)
    pub branch: Option<String>,

    /// API base URL (github; GitHub Enterprise)
    pub api_base: Option<String>,

    /// Root directory (local)
    pub root: Option<String>,
}

impl StoreConfig {
    /// Validate the store section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::store::valid_store_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid store provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }

        for (name, value) in [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("branch", &self.branch),
            ("root", &self.root),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "store.{} cannot be empty",
                        name
                    )));
                }
            }
        }

        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "store.api_base must be an http(s) URL, got '{}'",
                    api_base
                )));
            }
        }

        Ok(())
    }

    fn merged_with(&self, other: &StoreConfig) -> StoreConfig {
        StoreConfig {
            provider: other.provider.clone().or_else(|| self.provider.clone()),
            owner: other.owner.clone().or_else(|| self.owner.clone()),
            repo: other.repo.clone().or_else(|| self.repo.clone()),
            branch: other.branch.clone().or_else(|| self.branch.clone()),
            api_base: other.api_base.clone().or_else(|| self.api_base.clone()),
            root: other.root.clone().or_else(|| self.root.clone()),
        }
    }
}

/// Retry settings for transport failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: Option<u32>,

    /// Base delay; attempt `n` waits `base * 2^n`
    pub backoff_base_ms: Option<u64>,
}

impl RetryConfig {
    /// Validate the retry section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.max_retries {
            if n > MAX_RETRIES_LIMIT {
                return Err(ConfigError::InvalidValue(format!(
                    "retry.max_retries must be at most {}, got {}",
                    MAX_RETRIES_LIMIT, n
                )));
            }
        }
        if let Some(ms) = self.backoff_base_ms {
            if ms > BACKOFF_BASE_LIMIT_MS {
                return Err(ConfigError::InvalidValue(format!(
                    "retry.backoff_base_ms must be at most {}, got {}",
                    BACKOFF_BASE_LIMIT_MS, ms
                )));
            }
        }
        Ok(())
    }

    fn merged_with(&self, other: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_retries: other.max_retries.or(self.max_retries),
            backoff_base_ms: other.backoff_base_ms.or(self.backoff_base_ms),
        }
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use (only "file" today)
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn merged_with(&self, other: &SecretsConfig) -> SecretsConfig {
        SecretsConfig {
            provider: other.provider.clone().or_else(|| self.provider.clone()),
        }
    }
}
