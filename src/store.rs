//! Persisted set of already-notified entry keys.
//!
//! The state file is a pretty-printed JSON array of strings, sorted, so it
//! stays human-diffable. The set is written back after every single addition;
//! a crash mid-cycle can therefore repeat at most the one in-flight entry.

use crate::error::StoreError;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// The dedup gate. Single writer; owned by one poll cycle at a time.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    keys: BTreeSet<String>,
}

impl SeenStore {
    /// Read the state file. A missing file is an empty set, not an error.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] when the file exists but cannot be read, and
    /// [`StoreError::Format`] when it is not a JSON array of strings.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let keys = match fs::read_to_string(&path).await {
            Ok(raw) => {
                let list: Vec<String> =
                    serde_json::from_str(&raw).map_err(|source| StoreError::Format {
                        path: path.display().to_string(),
                        source,
                    })?;
                list.into_iter().collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state file yet; starting with an empty set");
                BTreeSet::new()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        debug!(count = keys.len(), "Loaded seen keys");
        Ok(Self { path, keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record `key`; returns `false` if it was already present.
    pub fn add(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Keys in sorted order.
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Write the whole set, sorted, via a sibling temp file and a rename.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = self.keys.len()))]
    pub async fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.keys).map_err(|source| StoreError::Format {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json.as_bytes()).await.map_err(io_err)?;
        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        debug!("Persisted seen keys");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::load(dir.path().join("state.json")).await.unwrap();
        assert_eq!(store.keys().count(), 0);
    }

    #[tokio::test]
    async fn test_persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = SeenStore::load(&path).await.unwrap();
        assert!(store.add("Zed|/wiki/Zed"));
        assert!(store.add("Ann|/wiki/Ann"));
        assert!(store.add("Ёж|/wiki/%D0%81%D0%B6"));
        assert!(!store.add("Ann|/wiki/Ann"));
        store.persist().await.unwrap();

        let reloaded = SeenStore::load(&path).await.unwrap();
        assert_eq!(reloaded.keys().count(), 3);
        assert!(reloaded.contains("Ann|/wiki/Ann"));
        assert!(reloaded.contains("Zed|/wiki/Zed"));
        assert!(reloaded.contains("Ёж|/wiki/%D0%81%D0%B6"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_on_disk_form_is_sorted_pretty_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = SeenStore::load(&path).await.unwrap();
        store.add("b|/wiki/B");
        store.add("Ёж|/wiki/Ezh");
        store.add("a|/wiki/A");
        store.persist().await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "[\n  \"a|/wiki/A\",\n  \"b|/wiki/B\",\n  \"Ёж|/wiki/Ezh\"\n]");
    }

    #[tokio::test]
    async fn test_duplicate_keys_on_disk_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"["x|/wiki/X","x|/wiki/X"]"#).unwrap();
        let store = SeenStore::load(&path).await.unwrap();
        assert_eq!(store.keys().collect::<Vec<_>>(), ["x|/wiki/X"]);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = SeenStore::load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }
}
