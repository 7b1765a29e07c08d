use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use streak_core::store::apply_to_map;
use streak_core::{KeyValueStore, StoreWrite, StreakError};
use tempfile::NamedTempFile;

pub fn streak_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STREAK_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".streak"))
}

pub fn ensure_streak_home() -> Result<PathBuf> {
    let dir = streak_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_streak_home()?.join("store.json"))
}

/// Flat string map persisted as pretty JSON.
///
/// Every batch is written to a temp file next to the store and renamed over
/// it, so readers see either the old map or the new one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if s.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = read_entries(path)
            .context("store is unreadable; run `streak reset` to start over")?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Open for a reset: an unreadable file is replaced rather than fatal.
    pub fn open_or_discard(path: &Path) -> Result<Self> {
        let entries = match read_entries(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{e:#}"),
                    "discarding unreadable store"
                );
                BTreeMap::new()
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&store_path()?)
    }

    fn write_atomic(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> std::result::Result<(), StreakError> {
        let fail = |what: &str, e: String| {
            StreakError::Store(format!("{what} {}: {e}", self.path.display()))
        };
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| fail("serialize", e.to_string()))?;

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| fail("create temp for", e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| fail("write", e.to_string()))?;
        tmp.persist(&self.path).map_err(|e| fail("replace", e.error.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> streak_core::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn apply(&mut self, batch: &[StoreWrite]) -> streak_core::Result<()> {
        let mut next = self.entries.clone();
        apply_to_map(&mut next, batch);
        if next == self.entries && self.path.exists() {
            return Ok(());
        }
        self.write_atomic(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_batch_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let mut store = FileStore::open(&path).unwrap();
        store
            .apply(&[
                StoreWrite::set("streak_count", "2"),
                StoreWrite::set("streak_last_checked", "2024-01-02"),
            ])
            .unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("streak_count").unwrap().as_deref(), Some("2"));
        assert_eq!(
            reopened.get("streak_last_checked").unwrap().as_deref(),
            Some("2024-01-02")
        );
    }

    #[test]
    fn test_failed_write_keeps_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("streak_count", "3").unwrap();

        // A directory in place of the file makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = store
            .apply(&[
                StoreWrite::set("streak_count", "4"),
                StoreWrite::remove("streak_last_checked"),
            ])
            .unwrap_err();
        assert!(matches!(err, StreakError::Store(_)));
        assert_eq!(store.get("streak_count").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_unreadable_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"streak_count": 5}"#).unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(format!("{err:#}").contains("streak reset"));

        let mut store = FileStore::open_or_discard(&path).unwrap();
        assert_eq!(store.get("streak_count").unwrap(), None);
        store.set("streak_count", "0").unwrap();
        assert!(FileStore::open(&path).is_ok());
    }
}
