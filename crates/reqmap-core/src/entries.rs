//! Entry file candidates for a package.

use crate::manifest::ManifestRecord;
use std::path::{Path, PathBuf};

/// Computes the files a package walk starts from.
pub trait EntryResolver: Send + Sync {
    /// Ordered candidate entry paths; `None` entries are skipped.
    fn entries(&self, package_dir: &Path, manifest: &ManifestRecord) -> Vec<Option<PathBuf>>;
}

/// Candidates from the manifest's entry fields: `main` (default `index`),
/// `module`, `unpkg` and a string `browser`, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestEntryResolver;

impl EntryResolver for ManifestEntryResolver {
    fn entries(&self, package_dir: &Path, manifest: &ManifestRecord) -> Vec<Option<PathBuf>> {
        let field = |f: &Option<String>| {
            f.as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| package_dir.join(s))
        };

        vec![
            Some(field(&manifest.main).unwrap_or_else(|| package_dir.join("index"))),
            field(&manifest.module),
            field(&manifest.unpkg),
            field(&manifest.browser),
        ]
    }
}
