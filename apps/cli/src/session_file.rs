use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};
use client_core::SessionStore;
use tracing::warn;

/// Session keys persisted as a flat JSON object so a login survives between
/// invocations of the binary.
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Opens the store at `path`. A missing file is an empty session; an
    /// unreadable one is logged and treated the same way.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring corrupt session file");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path);
        store.set("authtoken", "jwt-abc").expect("set");
        store.set("name", "Ana").expect("set");

        let reopened = FileSessionStore::open(&path);
        assert_eq!(reopened.get("authtoken").as_deref(), Some("jwt-abc"));
        assert_eq!(reopened.get("name").as_deref(), Some("Ana"));
    }

    #[test]
    fn removal_is_persisted_and_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path);
        store.set("authtoken", "jwt-abc").expect("set");
        store.remove("authtoken").expect("remove");
        store.remove("authtoken").expect("remove again");

        assert_eq!(FileSessionStore::open(&path).get("authtoken"), None);
    }

    #[test]
    fn corrupt_file_opens_as_empty_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("write");

        let store = FileSessionStore::open(&path);
        assert_eq!(store.get("authtoken"), None);
        assert_eq!(store.path(), path.as_path());
    }
}
