//! secrets
//!
//! Credential storage and token resolution.
//!
//! # Resolution Order
//!
//! [`resolve_token`] looks for a GitHub token in:
//! 1. `$TABLEDIT_TOKEN`
//! 2. `$GITHUB_TOKEN`
//! 3. the secret store, key [`GITHUB_TOKEN_KEY`]
//!
//! Tokens are never logged; only the source they came from is.

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

/// Secret store key holding the GitHub personal access token.
pub const GITHUB_TOKEN_KEY: &str = "github.pat";

/// Environment variables consulted before the secret store, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["TABLEDIT_TOKEN", "GITHUB_TOKEN"];

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Create the secret store named in configuration.
///
/// # Errors
///
/// `SecretError::ProviderNotAvailable` for an unknown provider, or the
/// store's own initialisation error.
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new()?)),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider '{}' (valid: file)",
            other
        ))),
    }
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env(&'static str),
    SecretStore(&'static str),
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Env(var) => write!(f, "${}", var),
            TokenSource::SecretStore(provider) => {
                write!(f, "{} secret store ({})", provider, GITHUB_TOKEN_KEY)
            }
        }
    }
}

/// A token and its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &"[redacted]")
            .field("source", &self.source)
            .finish()
    }
}

/// Find a GitHub token; `Ok(None)` if no source has one.
///
/// `env` looks up an environment variable, so callers and tests control
/// the environment explicitly. Blank values are skipped.
///
/// # Example
///
/// ```
/// use tabledit::secrets::{resolve_token, FileSecretStore, TokenSource};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileSecretStore::with_path(dir.path().join("secrets.toml"));
///
/// let env = |name: &str| (name == "GITHUB_TOKEN").then(|| "ghp_env".to_string());
/// let resolved = resolve_token(env, &store).unwrap().unwrap();
/// assert_eq!(resolved.source, TokenSource::Env("GITHUB_TOKEN"));
/// ```
pub fn resolve_token(
    env: impl Fn(&str) -> Option<String>,
    store: &dyn SecretStore,
) -> Result<Option<ResolvedToken>, SecretError> {
    for var in TOKEN_ENV_VARS {
        if let Some(token) = env(var).filter(|t| !t.trim().is_empty()) {
            tracing::debug!(source = var, "using token from environment");
            return Ok(Some(ResolvedToken {
                token: token.trim().to_string(),
                source: TokenSource::Env(var),
            }));
        }
    }

    match store.get(GITHUB_TOKEN_KEY)? {
        Some(token) if !token.trim().is_empty() => {
            tracing::debug!(provider = store.provider(), "using token from secret store");
            Ok(Some(ResolvedToken {
                token: token.trim().to_string(),
                source: TokenSource::SecretStore(store.provider()),
            }))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty_store() -> (TempDir, FileSecretStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(dir.path().join("secrets.toml"));
        (dir, store)
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = create_store("keychain").err().unwrap();
        assert!(err.to_string().contains("keychain"));
    }

    mod resolve_token {
        use super::*;

        #[test]
        fn tabledit_token_wins() {
            let (_dir, store) = empty_store();
            store.set(GITHUB_TOKEN_KEY, "stored").unwrap();
            let env = |name: &str| Some(format!("from-{}", name));

            let resolved = resolve_token(env, &store).unwrap().unwrap();
            assert_eq!(resolved.token, "from-TABLEDIT_TOKEN");
            assert_eq!(resolved.source, TokenSource::Env("TABLEDIT_TOKEN"));
        }

        #[test]
        fn blank_env_falls_through_to_store() {
            let (_dir, store) = empty_store();
            store.set(GITHUB_TOKEN_KEY, "stored\n").unwrap();
            let env = |_: &str| Some("  ".to_string());

            let resolved = resolve_token(env, &store).unwrap().unwrap();
            assert_eq!(resolved.token, "stored");
            assert_eq!(resolved.source, TokenSource::SecretStore("file"));
        }

        #[test]
        fn nothing_configured() {
            let (_dir, store) = empty_store();
            assert_eq!(resolve_token(|_| None, &store).unwrap(), None);
        }

        #[test]
        fn debug_redacts() {
            let resolved = ResolvedToken {
                token: "ghp_secret".into(),
                source: TokenSource::Env("GITHUB_TOKEN"),
            };
            assert!(!format!("{:?}", resolved).contains("ghp_secret"));
            assert_eq!(resolved.source.to_string(), "$GITHUB_TOKEN");
        }
    }
}
