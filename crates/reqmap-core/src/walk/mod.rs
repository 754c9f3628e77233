//! Dependency graph expansion into a [`FileMap`].
//!
//! Traversal is an explicit stack of pending paths, depth-first in
//! extraction order. Presence is checked before a path is pushed and again
//! when it is popped, so cycles terminate and no file is read twice.

mod file_map;

pub use file_map::{FileId, FileMap, FileRecord};

use crate::config::Config;
use crate::extract::extract_requires;
use crate::resolver::{
    resolve, resolve_entry, MemoryPkgJsonCache, ResolveContext, ResolveReasonCode, ResolveStatus,
};
use reqmap_util::fs::read_to_string_lossy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A specifier that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEdge {
    /// File containing the specifier.
    pub from: PathBuf,
    pub specifier: String,
    pub reason: ResolveReasonCode,
}

/// Per-edge outcomes of a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    /// Records added by the walk (seeded records excluded).
    pub files_added: usize,
    /// One entry per unresolved occurrence.
    pub unresolved: Vec<UnresolvedEdge>,
    /// Script files kept as leaves because extraction failed.
    pub extraction_failures: Vec<PathBuf>,
    /// Files that could not be read.
    pub unreadable: Vec<PathBuf>,
    /// Edges dropped by a `browser` map `false` entry.
    pub ignored: usize,
}

/// Expands entry files into a [`FileMap`].
///
/// One walker serves one package resolution; its map, manifest cache and
/// log dedup state are not shared.
#[derive(Debug)]
pub struct Walker<'a> {
    config: &'a Config,
    map: FileMap,
    report: WalkReport,
    warned: HashSet<String>,
    pkg_json_cache: MemoryPkgJsonCache,
}

impl<'a> Walker<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self::with_map(config, FileMap::new())
    }

    /// Start from a pre-built map. Its paths count as already visited.
    #[must_use]
    pub fn with_map(config: &'a Config, map: FileMap) -> Self {
        Self {
            config,
            map,
            report: WalkReport::default(),
            warned: HashSet::new(),
            pkg_json_cache: MemoryPkgJsonCache::new(),
        }
    }

    /// Walk from a package entry.
    ///
    /// Entries that do not exist literally get extension and index inference.
    pub fn walk_entry(&mut self, entry: &Path) {
        let ctx = ResolveContext::for_file(entry, &self.config.resolver)
            .with_pkg_json_cache(&self.pkg_json_cache);
        let result = resolve_entry(&ctx, entry);
        match result.resolved {
            Some(path) if result.status == ResolveStatus::Resolved => self.walk(&path),
            _ => debug!(
                entry = %entry.display(),
                reason = ?result.reason,
                "skipping unresolvable entry"
            ),
        }
    }

    /// Walk from `file`, adding it and everything it reaches.
    pub fn walk(&mut self, file: &Path) {
        let start = match dunce::canonicalize(file) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "cannot read file");
                self.report.unreadable.push(file.to_path_buf());
                return;
            }
        };

        let mut stack = vec![start];
        while let Some(path) = stack.pop() {
            if self.map.contains(&path) {
                continue;
            }
            let pending = self.visit(path);
            // Reversed so the first specifier is expanded first.
            stack.extend(pending.into_iter().rev());
        }
    }

    /// Store one file and return its resolved, not-yet-visited dependencies.
    fn visit(&mut self, path: PathBuf) -> Vec<PathBuf> {
        let content = match read_to_string_lossy(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                self.report.unreadable.push(path);
                return Vec::new();
            }
        };

        if !self.config.is_script(&path) {
            self.insert(FileRecord::leaf(path, content));
            return Vec::new();
        }

        let requires = match extract_requires(&content) {
            Ok(r) => r,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "extraction failed, keeping file as leaf");
                self.report.extraction_failures.push(path.clone());
                self.insert(FileRecord::leaf(path, content));
                return Vec::new();
            }
        };

        let pending = self.resolve_all(&path, &requires);
        self.insert(FileRecord {
            path,
            content,
            requires: Some(requires),
        });
        pending
    }

    fn resolve_all(&mut self, from: &Path, requires: &[String]) -> Vec<PathBuf> {
        let config = self.config;
        let ctx = ResolveContext::for_file(from, &config.resolver)
            .with_pkg_json_cache(&self.pkg_json_cache);
        let mut pending = Vec::new();

        for specifier in requires {
            let result = resolve(&ctx, specifier);
            match result.status {
                ResolveStatus::Resolved => {
                    if let Some(target) = result.resolved {
                        if target != from && !self.map.contains(&target) {
                            pending.push(target);
                        }
                    }
                }
                ResolveStatus::Ignored => {
                    debug!(specifier = %specifier, from = %from.display(), "ignored by browser map");
                    self.report.ignored += 1;
                }
                ResolveStatus::Unresolved => {
                    let reason = result.reason.unwrap_or(ResolveReasonCode::NotFound);
                    if self.warned.insert(specifier.clone()) {
                        warn!(
                            specifier = %specifier,
                            from = %from.display(),
                            reason = %reason,
                            "could not resolve"
                        );
                    }
                    self.report.unresolved.push(UnresolvedEdge {
                        from: from.to_path_buf(),
                        specifier: specifier.clone(),
                        reason,
                    });
                }
            }
        }

        pending
    }

    fn insert(&mut self, record: FileRecord) {
        if self.map.insert(record).is_some() {
            self.report.files_added += 1;
        }
    }

    #[must_use]
    pub fn map(&self) -> &FileMap {
        &self.map
    }

    /// Finish the walk, yielding the map and the report.
    #[must_use]
    pub fn finish(self) -> (FileMap, WalkReport) {
        (self.map, self.report)
    }
}
