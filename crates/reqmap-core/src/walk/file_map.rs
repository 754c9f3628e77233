//! Index-keyed file store.
//!
//! Records live in a `Vec`; a path table gives dedup and cycle checks.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Identifier of a record in a [`FileMap`].
pub type FileId = usize;

/// A file reached from a package entry (or seeded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute canonical path.
    pub path: PathBuf,
    /// Raw text (lossy UTF-8).
    pub content: String,
    /// Specifiers in first-appearance order. `None` for leaves.
    pub requires: Option<Vec<String>>,
}

impl FileRecord {
    /// A record with no requires.
    #[must_use]
    pub fn leaf(path: PathBuf, content: String) -> Self {
        Self {
            path,
            content,
            requires: None,
        }
    }
}

impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.requires.is_some() { 2 } else { 1 };
        let mut state = serializer.serialize_struct("FileRecord", len)?;
        state.serialize_field("content", &self.content)?;
        if let Some(requires) = &self.requires {
            state.serialize_field("requires", requires)?;
        }
        state.end()
    }
}

/// Absolute path to record, with unique keys.
#[derive(Debug, Clone, Default)]
pub struct FileMap {
    records: Vec<FileRecord>,
    path_to_id: HashMap<PathBuf, FileId>,
}

impl FileMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its path is already present.
    ///
    /// Returns the new id, or `None` if the path was taken.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileId> {
        if self.path_to_id.contains_key(&record.path) {
            return None;
        }
        let id = self.records.len();
        self.path_to_id.insert(record.path.clone(), id);
        self.records.push(record);
        Some(id)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.path_to_id.contains_key(path)
    }

    #[must_use]
    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn get_by_path(&self, path: &Path) -> Option<&FileRecord> {
        self.path_to_id.get(path).map(|&id| &self.records[id])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    /// Consume the map, yielding its records in insertion order.
    #[must_use]
    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }
}

impl Serialize for FileMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.path.to_string_lossy(), record)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, content: &str) -> FileRecord {
        FileRecord::leaf(PathBuf::from(path), content.to_string())
    }

    #[test]
    fn test_empty_map() {
        let map = FileMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_insert_dedups() {
        let mut map = FileMap::new();
        assert_eq!(map.insert(record("/p/a.js", "1")), Some(0));
        assert_eq!(map.insert(record("/p/a.js", "2")), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_path(Path::new("/p/a.js")).unwrap().content, "1");
    }

    #[test]
    fn test_get_by_id() {
        let mut map = FileMap::new();
        let id = map.insert(record("/p/a.js", "a")).unwrap();
        assert_eq!(map.get(id).unwrap().path, PathBuf::from("/p/a.js"));
        assert!(map.get(id + 1).is_none());
    }

    #[test]
    fn test_serialize_omits_absent_requires() {
        let mut map = FileMap::new();
        map.insert(FileRecord {
            path: PathBuf::from("/p/a.js"),
            content: "x".to_string(),
            requires: Some(vec!["./b".to_string()]),
        });
        map.insert(record("/p/b.css", "y"));

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["/p/a.js"]["requires"][0], "./b");
        assert_eq!(json["/p/b.css"]["content"], "y");
        assert!(json["/p/b.css"].get("requires").is_none());
    }
}
