use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{StorageError, TokenStore};

/// JSON file holding a flat string map. Every call goes to disk so that
/// separate processes see each other's writes.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Entries to write back. An unreadable file is replaced, losing its other keys.
    fn load_for_write(&self) -> BTreeMap<String, String> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("Overwriting unreadable token storage {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(entries) => entries.get(key).cloned(),
            Err(e) => {
                tracing::warn!("Unreadable token storage {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load_for_write();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load_for_write();
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("poetry-storage-{}", uuid::Uuid::new_v4().simple()))
            .join("storage.json")
    }

    #[test]
    fn set_get_remove_roundtrip_on_disk() {
        let path = scratch_path();
        let store = FileTokenStore::new(&path);

        assert_eq!(store.get("supabase_token"), None);
        store.set("supabase_token", "abc").unwrap();
        store.set("token", "legacy").unwrap();

        // A second handle on the same file sees the writes
        let other = FileTokenStore::new(&path);
        assert_eq!(other.get("supabase_token").as_deref(), Some("abc"));

        other.remove("supabase_token").unwrap();
        assert_eq!(store.get("supabase_token"), None);
        assert_eq!(store.get("token").as_deref(), Some("legacy"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get("supabase_token"), None);
        store.set("supabase_token", "fresh").unwrap();
        assert_eq!(store.get("supabase_token").as_deref(), Some("fresh"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn write_over_corrupt_file_starts_fresh() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"token": "legacy""#).unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.load_for_write(), BTreeMap::new());
        store.set("supabase_token", "fresh").unwrap();

        let on_disk: BTreeMap<String, String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.get("supabase_token").map(String::as_str), Some("fresh"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
