//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! tabledit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: `.tabledit.toml` in the working directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TABLEDIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tabledit/config.toml`
//! 3. `~/.tabledit/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use tabledit::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! println!("Store: {}", config.store_provider());
//! println!("Retries: {}", config.retry_policy().max_retries);
//! ```

pub mod schema;

pub use schema::{ConfigFile, RetryConfig, SecretsConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pipeline::RetryPolicy;
use crate::store::{StoreProvider, StoreSettings};

/// File name of the project-scope configuration.
pub const PROJECT_CONFIG_FILE: &str = ".tabledit.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Project configuration (if present)
    pub project: Option<ConfigFile>,
    /// Global and project merged, project winning
    effective: ConfigFile,
    /// Directory relative paths in the config resolve against
    base_dir: Option<PathBuf>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads `.tabledit.toml` from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(project_dir: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_from(Self::find_global().as_deref(), project_dir)
    }

    /// Load configuration from an explicit global file.
    ///
    /// A `global_path` that does not exist is treated as absent.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Config, ConfigError> {
        let (global, global_path) = match global_path {
            Some(path) if path.exists() => (Self::read_config(path)?, Some(path.to_path_buf())),
            _ => (ConfigFile::default(), None),
        };

        let (project, project_path) = match project_dir {
            Some(dir) => {
                let path = dir.join(PROJECT_CONFIG_FILE);
                if path.exists() {
                    (Some(Self::read_config(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        let effective = match &project {
            Some(p) => global.merged_with(p),
            None => global.clone(),
        };

        Ok(Config {
            global,
            project,
            effective,
            base_dir: project_dir.map(Path::to_path_buf),
            global_path,
            project_path,
        })
    }

    /// Build a configuration directly from a file value (no I/O).
    pub fn from_file(file: ConfigFile, base_dir: Option<PathBuf>) -> Result<Config, ConfigError> {
        file.validate()?;
        Ok(Config {
            effective: file.clone(),
            global: file,
            project: None,
            base_dir,
            global_path: None,
            project_path: None,
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TABLEDIT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("tabledit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".tabledit/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The merged configuration.
    pub fn effective(&self) -> &ConfigFile {
        &self.effective
    }

    /// Get the store provider name.
    ///
    /// Defaults to "disabled" if not configured.
    pub fn store_provider(&self) -> &str {
        self.effective
            .store
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("disabled")
    }

    /// Get the retry policy.
    ///
    /// Unset fields fall back to [`RetryPolicy::default`].
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let retry = self.effective.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_retries: retry.max_retries.unwrap_or(defaults.max_retries),
            backoff_base_ms: retry.backoff_base_ms.unwrap_or(defaults.backoff_base_ms),
        }
    }

    /// Get the secrets provider.
    ///
    /// Defaults to "file" if not configured.
    pub fn secrets_provider(&self) -> &str {
        self.effective
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or("file")
    }

    /// Resolve the settings the store factory needs.
    ///
    /// `token` is only used by the github provider. A relative local root
    /// resolves against the project directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the chosen provider is missing
    /// a required field.
    pub fn store_settings(&self, token: Option<String>) -> Result<StoreSettings, ConfigError> {
        let store = self.effective.store.clone().unwrap_or_default();
        let provider = StoreProvider::parse(self.store_provider()).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "unknown store provider '{}'",
                self.store_provider()
            ))
        })?;

        match provider {
            StoreProvider::GitHub => {
                let owner = store.owner.ok_or_else(|| {
                    ConfigError::InvalidValue("store.owner is required for github".into())
                })?;
                let repo = store.repo.ok_or_else(|| {
                    ConfigError::InvalidValue("store.repo is required for github".into())
                })?;
                Ok(StoreSettings::GitHub {
                    owner,
                    repo,
                    branch: store.branch,
                    api_base: store.api_base,
                    token,
                })
            }
            StoreProvider::Local => {
                let root = store.root.ok_or_else(|| {
                    ConfigError::InvalidValue("store.root is required for local".into())
                })?;
                let root = PathBuf::from(root);
                let root = match (&self.base_dir, root.is_relative()) {
                    (Some(base), true) => base.join(root),
                    _ => root,
                };
                Ok(StoreSettings::Local { root })
            }
            StoreProvider::Disabled => Ok(StoreSettings::Disabled),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(None, Some(temp.path())).unwrap();

        assert_eq!(config.store_provider(), "disabled");
        assert_eq!(config.secrets_provider(), "file");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.project_config_loaded_from().is_none());
        assert!(matches!(
            config.store_settings(None).unwrap(),
            StoreSettings::Disabled
        ));
    }

    #[test]
    fn missing_global_path_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(Some(&temp.path().join("nope.toml")), None).unwrap();
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_path = temp.path().join("global.toml");
        fs::write(
            &global_path,
            r#"
            [store]
            provider = "github"
            owner = "acme"
            repo = "datasets"

            [retry]
            max_retries = 4
            "#,
        )
        .unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            r#"
            [store]
            branch = "staging"
            "#,
        )
        .unwrap();

        let config = Config::load_from(Some(&global_path), Some(temp.path())).unwrap();
        assert_eq!(config.global_config_loaded_from(), Some(global_path.as_path()));
        assert!(config.project_config_loaded_from().is_some());
        assert_eq!(config.retry_policy().max_retries, 4);

        match config.store_settings(Some("tok".into())).unwrap() {
            StoreSettings::GitHub {
                owner,
                repo,
                branch,
                token,
                ..
            } => {
                assert_eq!(owner, "acme");
                assert_eq!(repo, "datasets");
                assert_eq!(branch.as_deref(), Some("staging"));
                assert_eq!(token.as_deref(), Some("tok"));
            }
            other => panic!("expected github settings, got {:?}", other),
        }
    }

    #[test]
    fn github_requires_owner_and_repo() {
        let file: ConfigFile = toml::from_str("[store]\nprovider = \"github\"").unwrap();
        let config = Config::from_file(file, None).unwrap();
        let err = config.store_settings(None).unwrap_err();
        assert!(err.to_string().contains("store.owner"));
    }

    #[test]
    fn local_root_resolves_against_project_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[store]\nprovider = \"local\"\nroot = \"data\"\n",
        )
        .unwrap();

        let config = Config::load_from(None, Some(temp.path())).unwrap();
        match config.store_settings(None).unwrap() {
            StoreSettings::Local { root } => assert_eq!(root, temp.path().join("data")),
            other => panic!("expected local settings, got {:?}", other),
        }
    }

    #[test]
    fn invalid_project_file_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[store]\nprovider = \"ftp\"\n",
        )
        .unwrap();

        assert!(Config::load_from(None, Some(temp.path())).is_err());
    }

    #[test]
    fn unparseable_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(PROJECT_CONFIG_FILE);
        fs::write(&path, "[store\n").unwrap();

        let err = Config::load_from(None, Some(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(".tabledit.toml"));
    }
}
