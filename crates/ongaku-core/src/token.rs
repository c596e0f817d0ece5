//! Persisted auth token: one opaque string, one file.
//!
//! Created on login, read on every authenticated request, deleted on logout.
//! No expiry handling; an invalid token surfaces as failed requests.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AppConfig;
use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Token store at the platform data dir.
    pub fn open_default() -> Result<Self, CoreError> {
        Ok(Self {
            path: AppConfig::ensure_token_path()?,
        })
    }

    /// Token store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, or `None` when absent or empty.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!("failed to read token file: {e}");
                None
            }
        }
    }

    pub fn store(&self, token: &str) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
            .map_err(|e| CoreError::Token(format!("failed to write {}: {e}", self.path.display())))
    }

    /// Delete the stored token. Already-absent is not an error.
    pub fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Token(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in_tempdir() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        (dir, store)
    }

    #[test]
    fn test_roundtrip() {
        let (_dir, store) = store_in_tempdir();
        assert_eq!(store.load(), None);

        store.store("abc.def.ghi").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, store) = store_in_tempdir();
        store.store("tok").unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
        // Clearing again is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_whitespace_only_file_is_no_token() {
        let (_dir, store) = store_in_tempdir();
        store.store("  \n").unwrap();
        assert_eq!(store.load(), None);
    }
}
