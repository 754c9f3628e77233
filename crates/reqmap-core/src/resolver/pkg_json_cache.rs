//! Parsed `package.json` cache.
//!
//! A resolution step may consult the same manifest several times (bare
//! alias lookup, directory entry fields, file aliasing). A cache lets those
//! reads share one parse. It lives no longer than the walk that owns it.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Cache of parsed manifests, keyed by `package.json` path.
pub trait PkgJsonCache: Send + Sync + std::fmt::Debug {
    /// Look up a parsed manifest.
    fn get(&self, path: &Path) -> Option<Arc<Value>>;

    /// Store a parsed manifest.
    fn set(&self, path: &Path, value: Arc<Value>);
}

/// In-memory cache without invalidation.
#[derive(Debug, Default)]
pub struct MemoryPkgJsonCache {
    entries: Mutex<HashMap<PathBuf, Arc<Value>>>,
}

impl MemoryPkgJsonCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached manifests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PkgJsonCache for MemoryPkgJsonCache {
    fn get(&self, path: &Path) -> Option<Arc<Value>> {
        self.entries.lock().ok()?.get(path).cloned()
    }

    fn set(&self, path: &Path, value: Arc<Value>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(path.to_path_buf(), value);
        }
    }
}
