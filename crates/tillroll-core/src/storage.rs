//! Local key/value storage
//!
//! The client persists exactly three values: the session token, the cached
//! user profile (as JSON), and the theme preference. On disk they live in one
//! JSON object that is replaced atomically on every write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

pub const TOKEN_KEY: &str = "jwt_token";
pub const USER_KEY: &str = "current_user";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open (or lazily create) the storage file at `path`
    ///
    /// A corrupt file is treated as empty rather than failing startup.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Storage that never touches disk (for tests)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.into());
        self.commit(next)
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }

    /// Remove several keys with a single write
    pub fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let mut next = self.entries.clone();
        let mut changed = false;
        for key in keys {
            changed |= next.remove(*key).is_some();
        }
        if changed {
            self.commit(next)?;
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write `next` to disk, and only then make it the in-memory state
    fn commit(&mut self, next: BTreeMap<String, String>) -> Result<()> {
        if let Some(path) = self.path.as_deref() {
            write_entries(path, &next)?;
        }
        self.entries = next;
        Ok(())
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!("Wrote storage file {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let mut storage = LocalStorage::in_memory();
        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY), Some("abc"));

        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert!(storage.path().is_none());
    }

    #[test]
    fn test_file_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = LocalStorage::open(&path).unwrap();
        storage.set(TOKEN_KEY, "token-1").unwrap();
        storage.set(THEME_KEY, "dark").unwrap();

        let reopened = LocalStorage::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY), Some("token-1"));
        assert_eq!(reopened.get(THEME_KEY), Some("dark"));
    }

    #[test]
    fn test_remove_all_clears_session_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut storage = LocalStorage::open(&path).unwrap();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(USER_KEY, "{}").unwrap();
        storage.set(THEME_KEY, "dark").unwrap();
        storage.remove_all(&[TOKEN_KEY, USER_KEY]).unwrap();

        let reopened = LocalStorage::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY), None);
        assert_eq!(reopened.get(USER_KEY), None);
        assert_eq!(reopened.get(THEME_KEY), Some("dark"));
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = LocalStorage::open(&path).unwrap();
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocked").join("storage.json");

        let mut storage = LocalStorage::open(&path).unwrap();
        storage.set(THEME_KEY, "dark").unwrap();

        // Replace the parent directory with a plain file so writes fail
        fs::remove_dir_all(dir.path().join("blocked")).unwrap();
        fs::write(dir.path().join("blocked"), "not a directory").unwrap();

        assert!(storage.set(TOKEN_KEY, "t").is_err());
        assert_eq!(storage.get(TOKEN_KEY), None);

        assert!(storage.remove_all(&[THEME_KEY]).is_err());
        assert_eq!(storage.get(THEME_KEY), Some("dark"));
    }
}
