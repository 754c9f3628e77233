//! Package file-map construction.
//!
//! [`find_requires`] ties the pieces together: manifest lookup, entry
//! candidates, optional seeding, the walk, then the size guard.

use crate::config::Config;
use crate::entries::{EntryResolver, ManifestEntryResolver};
use crate::guard::{finalize, GuardOutcome};
use crate::manifest::{ManifestLookup, PackageContext};
use crate::paths::{manifest_path, package_dir};
use crate::seed::{ReasonSeeder, Seeder};
use crate::walk::{FileMap, FileRecord, WalkReport, Walker};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Collaborators and configuration for a package resolution.
pub struct FindOptions {
    pub config: Config,
    pub entry_resolver: Box<dyn EntryResolver>,
    pub seeder: Box<dyn Seeder>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            entry_resolver: Box::new(ManifestEntryResolver),
            seeder: Box::new(ReasonSeeder),
        }
    }
}

impl FindOptions {
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_entry_resolver(mut self, resolver: impl EntryResolver + 'static) -> Self {
        self.entry_resolver = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn with_seeder(mut self, seeder: impl Seeder + 'static) -> Self {
        self.seeder = Box::new(seeder);
        self
    }
}

impl std::fmt::Debug for FindOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Result of resolving one package.
#[derive(Debug, Clone)]
pub struct FindResult {
    /// Root-relative path to record.
    pub files: BTreeMap<String, FileRecord>,
    /// `None` when the package has no manifest in the lookup.
    pub outcome: Option<GuardOutcome>,
    /// Serialized length of the absolute map before the guard, in UTF-16
    /// code units.
    pub size: u64,
    pub report: WalkReport,
}

impl FindResult {
    fn missing() -> Self {
        Self {
            files: BTreeMap::new(),
            outcome: None,
            size: 0,
            report: WalkReport::default(),
        }
    }
}

/// Build the file map of `package_name`, installed at
/// `{root}/node_modules/{package_name}`.
///
/// A package absent from `manifests` yields an empty result without touching
/// the filesystem. Per-file and per-edge failures are logged and skipped.
#[must_use]
pub fn find_requires(
    package_name: &str,
    root: &Path,
    manifests: &ManifestLookup,
    options: &FindOptions,
) -> FindResult {
    let Some(manifest) = manifests.get(&manifest_path(root, package_name)) else {
        debug!(package = package_name, "no manifest, nothing to walk");
        return FindResult::missing();
    };

    let package = PackageContext {
        root: dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()),
        package_dir: package_dir(root, package_name),
        capabilities: manifest.capabilities(),
    };

    let seeded = if options.seeder.matches(package_name, root) {
        match options.seeder.seed(root, manifests) {
            Ok(map) => {
                debug!(package = package_name, files = map.len(), "seeded file map");
                map
            }
            Err(e) => {
                warn!(package = package_name, error = %e, "seeding failed, walking unseeded");
                FileMap::new()
            }
        }
    } else {
        FileMap::new()
    };

    let mut walker = Walker::with_map(&options.config, seeded);
    for entry in options
        .entry_resolver
        .entries(&package.package_dir, manifest)
        .into_iter()
        .flatten()
    {
        walker.walk_entry(&entry);
    }
    let (map, report) = walker.finish();

    let finalized = finalize(
        map,
        package.capabilities,
        &package.root,
        options.config.size_limit,
    );

    FindResult {
        files: finalized.files,
        outcome: Some(finalized.outcome),
        size: finalized.size,
        report,
    }
}

/// Resolve several packages in parallel, preserving input order.
///
/// Each package gets its own walk; nothing is shared between them.
#[must_use]
pub fn find_requires_batch<S: AsRef<str> + Sync>(
    package_names: &[S],
    root: &Path,
    manifests: &ManifestLookup,
    options: &FindOptions,
) -> Vec<(String, FindResult)> {
    package_names
        .par_iter()
        .map(|name| {
            let name = name.as_ref();
            (name.to_string(), find_requires(name, root, manifests, options))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::scan_manifests;
    use crate::seed::NoSeeder;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_manifest_is_empty() {
        let dir = tempdir().unwrap();
        let result = find_requires("nope", dir.path(), &ManifestLookup::new(), &FindOptions::default());
        assert!(result.files.is_empty());
        assert!(result.outcome.is_none());
    }

    #[test]
    fn test_find_simple_package() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("a");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name": "a", "main": "main.js"}"#).unwrap();
        fs::write(pkg.join("main.js"), "require('./util');").unwrap();
        fs::write(pkg.join("util.js"), "").unwrap();

        let manifests = scan_manifests(dir.path());
        let options = FindOptions::default().with_seeder(NoSeeder);
        let result = find_requires("a", dir.path(), &manifests, &options);

        assert_eq!(result.outcome, Some(GuardOutcome::Kept));
        let keys: Vec<&str> = result.files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/node_modules/a/main.js", "/node_modules/a/util.js"]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let dir = tempdir().unwrap();
        for name in ["a", "b"] {
            let pkg = dir.path().join("node_modules").join(name);
            fs::create_dir_all(&pkg).unwrap();
            fs::write(pkg.join("package.json"), "{}").unwrap();
            fs::write(pkg.join("index.js"), "").unwrap();
        }

        let manifests = scan_manifests(dir.path());
        let results = find_requires_batch(&["b", "a", "c"], dir.path(), &manifests, &FindOptions::default());
        let names: Vec<&str> = results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(results[0].1.files.len(), 1);
        assert!(results[2].1.outcome.is_none());
    }
}
