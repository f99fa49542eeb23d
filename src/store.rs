//! Sled-based points store
//! Persistent key-value storage with crash safety

use crate::error::{LedgerError, Result};
use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::path::PathBuf;
use std::sync::Arc;

/// Persistent store backing the points ledger, backed by sled
pub struct PointsStore {
    db: Arc<Db>,
}

impl PointsStore {
    /// Create or open a points store at the default location
    pub fn new() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open(path)
    }

    /// Open a points store at a specific path
    pub fn open(path: PathBuf) -> Result<Self> {
        let db = sled::open(&path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Get the default database path
    fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| {
            LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory found",
            ))
        })?;
        path.push("guild-points");
        path.push("points.db");

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(path)
    }

    /// Get a typed value by key
    pub fn get<T: DeserializeOwned>(&self, tree: &str, key: &str) -> Result<Option<T>> {
        let tree = self.db.open_tree(tree)?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by key
    pub fn set<T: Serialize>(&self, tree: &str, key: &str, value: &T) -> Result<()> {
        let tree = self.db.open_tree(tree)?;
        let bytes = serde_json::to_vec(value)?;
        tree.insert(key.as_bytes(), bytes)?;
        tree.flush()?;
        Ok(())
    }

    /// Insert a typed value only if the key is absent (atomic compare-and-swap).
    /// Returns true if the value was created, false if the key already existed;
    /// an existing value is never overwritten.
    pub fn create_if_absent<T: Serialize>(&self, tree: &str, key: &str, value: &T) -> Result<bool> {
        let tree = self.db.open_tree(tree)?;
        let bytes = serde_json::to_vec(value)?;
        let created = tree
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))?
            .is_ok();
        if created {
            tree.flush()?;
        }
        Ok(created)
    }

    /// Atomically update a typed value in place.
    /// The closure receives the current value (None if absent) and returns the
    /// new value (None deletes / leaves absent). Returns the value left in the
    /// store. The closure cannot return Result; an undecodable record is left
    /// untouched.
    pub fn update<T, F>(&self, tree: &str, key: &str, mut f: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(Option<T>) -> Option<T>,
    {
        let tree = self.db.open_tree(tree)?;
        let result = tree.update_and_fetch(key.as_bytes(), |old| match old {
            Some(bytes) => match serde_json::from_slice::<T>(bytes) {
                Ok(value) => f(Some(value)).and_then(|v| serde_json::to_vec(&v).ok()),
                // Keep the existing bytes rather than destroy a record we
                // cannot decode
                Err(_) => Some(bytes.to_vec()),
            },
            None => f(None).and_then(|v| serde_json::to_vec(&v).ok()),
        })?;
        tree.flush()?;

        match result {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a key
    pub fn delete(&self, tree: &str, key: &str) -> Result<()> {
        let tree = self.db.open_tree(tree)?;
        tree.remove(key.as_bytes())?;
        tree.flush()?;
        Ok(())
    }

    /// Count items in a tree (O(1))
    pub fn count(&self, tree: &str) -> Result<usize> {
        let tree = self.db.open_tree(tree)?;
        Ok(tree.len())
    }

    /// Get all values in a tree. Undecodable records are skipped with a warning.
    pub fn get_all<T: DeserializeOwned>(&self, tree: &str) -> Result<Vec<T>> {
        let tree = self.db.open_tree(tree)?;
        let mut values = Vec::new();
        for item in tree.iter().values() {
            let bytes = item?;
            match serde_json::from_slice(&bytes) {
                Ok(value) => values.push(value),
                Err(e) => tracing::warn!("Skipping undecodable record: {}", e),
            }
        }
        Ok(values)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size info: (bytes on disk, record count across all trees)
    pub fn size_info(&self) -> (u64, u64) {
        let records: u64 = self
            .db
            .tree_names()
            .into_iter()
            .filter_map(|name| self.db.open_tree(name).ok())
            .map(|t| t.len() as u64)
            .sum();
        (self.db.size_on_disk().unwrap_or(0), records)
    }
}

impl Clone for PointsStore {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_operations() {
        let dir = tempdir().unwrap();
        let store = PointsStore::open(dir.path().join("test.db")).unwrap();

        // Test set/get
        store.set("test", "key1", &"value1".to_string()).unwrap();
        let value: Option<String> = store.get("test", "key1").unwrap();
        assert_eq!(value, Some("value1".to_string()));

        // Test delete
        store.delete("test", "key1").unwrap();
        let value: Option<String> = store.get("test", "key1").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_size_info_reflects_writes() {
        let dir = tempdir().unwrap();
        let store = PointsStore::open(dir.path().join("test.db")).unwrap();

        store.set("test", "k1", &1u32).unwrap();
        store.set("test", "k2", &2u32).unwrap();
        store.flush().unwrap();

        let (bytes_on_disk, records) = store.size_info();
        assert!(bytes_on_disk > 0);
        assert_eq!(records, 2);
    }

    #[test]
    fn test_create_if_absent_never_overwrites() {
        let dir = tempdir().unwrap();
        let store = PointsStore::open(dir.path().join("test.db")).unwrap();

        assert!(store.create_if_absent("test", "k", &1u32).unwrap());
        assert!(!store.create_if_absent("test", "k", &2u32).unwrap());

        let value: Option<u32> = store.get("test", "k").unwrap();
        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_update() {
        let dir = tempdir().unwrap();
        let store = PointsStore::open(dir.path().join("test.db")).unwrap();

        // Absent + closure declines to create: stays absent
        let result = store
            .update("test", "k", |old: Option<u32>| old.map(|v| v + 1))
            .unwrap();
        assert_eq!(result, None);

        store.set("test", "k", &10u32).unwrap();
        let result = store
            .update("test", "k", |old: Option<u32>| old.map(|v| v + 1))
            .unwrap();
        assert_eq!(result, Some(11));
        let value: Option<u32> = store.get("test", "k").unwrap();
        assert_eq!(value, Some(11));
    }
}
