//! secrets::file_store
//!
//! Secrets in a TOML file, `~/.tabledit/secrets.toml` by default.
//!
//! The file is written to a sibling temp file with mode 0600 (Unix) and
//! renamed into place, so a reader never sees a partial file and the
//! permissions never widen. Keys are kept sorted so rewrites are stable.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

use super::traits::{SecretError, SecretStore};

/// Directory under the home directory holding tabledit's files.
const HOME_DIR: &str = ".tabledit";

/// Secrets file name.
const SECRETS_FILE: &str = "secrets.toml";

/// File-backed [`SecretStore`].
///
/// # Example
///
/// ```
/// use tabledit::secrets::{FileSecretStore, SecretStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileSecretStore::with_path(dir.path().join("secrets.toml"));
///
/// store.set("github.pat", "ghp_example").unwrap();
/// assert_eq!(store.get("github.pat").unwrap().as_deref(), Some("ghp_example"));
/// assert!(store.delete("github.pat").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at `~/.tabledit/secrets.toml`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Read` if the home directory cannot be found.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::Read("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(HOME_DIR).join(SECRETS_FILE)))
    }

    /// Store at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail if the file exists and group or others can access it.
    #[cfg(unix)]
    pub fn check_permissions(&self) -> Result<(), SecretError> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.permissions().mode() & 0o077 != 0 => Err(
                SecretError::InsecurePermissions(self.path.display().to_string()),
            ),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SecretError::Read(format!(
                "cannot stat '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    #[cfg(not(unix))]
    pub fn check_permissions(&self) -> Result<(), SecretError> {
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SecretError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SecretError::Read(format!(
                    "'{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        // The toml error would quote the offending line, which may hold a
        // secret; report only where it is.
        toml::from_str(&text).map_err(|e| {
            let at = e
                .span()
                .map(|span| format!(" at byte {}", span.start))
                .unwrap_or_default();
            SecretError::Read(format!("'{}' is not valid TOML{}", self.path.display(), at))
        })
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        let write_err =
            |what: &str, e: std::io::Error| SecretError::Write(format!("{}: {}", what, e));

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| write_err("cannot create directory", e))?;

        let text = toml::to_string(secrets)
            .map_err(|e| SecretError::Write(format!("cannot serialise secrets: {}", e)))?;

        let tmp = dir.join(format!(
            ".{}.{}.tmp",
            SECRETS_FILE,
            uuid::Uuid::new_v4().simple()
        ));
        let result = (|| {
            let mut options = OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options
                .open(&tmp)
                .map_err(|e| write_err("cannot create temp file", e))?;
            file.write_all(text.as_bytes())
                .map_err(|e| write_err("cannot write temp file", e))?;
            file.sync_all()
                .map_err(|e| write_err("cannot sync temp file", e))?;
            fs::rename(&tmp, &self.path).map_err(|e| write_err("cannot replace secrets file", e))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

impl SecretStore for FileSecretStore {
    fn provider(&self) -> &'static str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets)?;
        tracing::debug!(key, path = %self.path.display(), "secret stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, SecretError> {
        let mut secrets = self.load()?;
        if secrets.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&secrets)?;
        tracing::debug!(key, path = %self.path.display(), "secret removed");
        Ok(true)
    }
}
