//! Package manifests and the lookup the walker is driven from.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// The manifest fields the walker cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestRecord {
    pub name: Option<String>,
    /// Primary entry field.
    pub main: Option<String>,
    /// ES module entry field.
    pub module: Option<String>,
    /// Alternate (UMD) bundle entry field.
    pub unpkg: Option<String>,
    /// String form of `browser`; the object form is handled by the resolver.
    pub browser: Option<String>,
}

impl ManifestRecord {
    /// Extract the record from a parsed `package.json`.
    ///
    /// Fields of the wrong type are treated as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: field("name"),
            main: field("main"),
            module: field("module"),
            unpkg: field("unpkg"),
            browser: field("browser"),
        }
    }

    /// Which entry fields are declared (non-empty).
    #[must_use]
    pub fn capabilities(&self) -> EntryCapabilities {
        let declared = |f: &Option<String>| f.as_deref().is_some_and(|s| !s.is_empty());
        EntryCapabilities {
            main: declared(&self.main),
            module: declared(&self.module),
            unpkg: declared(&self.unpkg),
        }
    }
}

/// Presence of the entry fields that signal a clear consumption pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryCapabilities {
    pub main: bool,
    pub module: bool,
    pub unpkg: bool,
}

impl EntryCapabilities {
    /// Whether any entry field is declared.
    #[must_use]
    pub fn any(self) -> bool {
        self.main || self.module || self.unpkg
    }
}

/// Absolute manifest path to record.
pub type ManifestLookup = HashMap<PathBuf, ManifestRecord>;

/// The package being resolved.
#[derive(Debug, Clone)]
pub struct PackageContext {
    /// Project root (the directory holding `node_modules`).
    pub root: PathBuf,
    /// `{root}/node_modules/{name}`.
    pub package_dir: PathBuf,
    pub capabilities: EntryCapabilities,
}

/// Read a single manifest.
pub fn read_manifest(path: &Path) -> Result<ManifestRecord> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| Error::ManifestParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ManifestRecord::from_value(&value))
}

/// Collect every installed package manifest under `{root}/node_modules`.
///
/// Includes scoped packages and nested `node_modules`. Manifests that cannot
/// be read or parsed are skipped with a warning.
#[must_use]
pub fn scan_manifests(root: &Path) -> ManifestLookup {
    let mut lookup = ManifestLookup::new();
    let node_modules = root.join("node_modules");
    if !node_modules.is_dir() {
        return lookup;
    }

    let walker = WalkDir::new(&node_modules)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            !e.file_type().is_dir() || !e.file_name().to_string_lossy().starts_with('.')
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "failed to walk node_modules");
                continue;
            }
        };
        if entry.file_name() != "package.json" || !entry.file_type().is_file() {
            continue;
        }
        let Some(pkg_dir) = entry.path().parent() else {
            continue;
        };
        if !is_installed_package_dir(root, pkg_dir) {
            continue;
        }

        match read_manifest(entry.path()) {
            Ok(record) => {
                lookup.insert(entry.path().to_path_buf(), record);
            }
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping manifest"),
        }
    }

    lookup
}

/// Whether `dir` (under `root`) is `node_modules/[@scope/]name`, possibly nested.
fn is_installed_package_dir(root: &Path, dir: &Path) -> bool {
    let Ok(rel) = dir.strip_prefix(root) else {
        return false;
    };
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let mut i = 0;
    while i < parts.len() {
        if parts[i] != "node_modules" {
            return false;
        }
        i += 1;
        match parts.get(i) {
            Some(scope) if scope.starts_with('@') => {
                if parts.get(i + 1).is_none() {
                    return false;
                }
                i += 2;
            }
            Some(_) => i += 1,
            None => return false,
        }
    }

    !parts.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_pkg(dir: &Path, manifest: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
    }

    #[test]
    fn test_from_value_ignores_wrong_types() {
        let record = ManifestRecord::from_value(&json!({
            "name": "a",
            "main": "index.js",
            "module": 7,
            "browser": {"fs": false}
        }));
        assert_eq!(record.name.as_deref(), Some("a"));
        assert_eq!(record.main.as_deref(), Some("index.js"));
        assert!(record.module.is_none());
        assert!(record.browser.is_none());
    }

    #[test]
    fn test_capabilities() {
        let none = ManifestRecord::default().capabilities();
        assert!(!none.any());

        let empty_main = ManifestRecord {
            main: Some(String::new()),
            ..ManifestRecord::default()
        };
        assert!(!empty_main.capabilities().any());

        let unpkg = ManifestRecord {
            unpkg: Some("dist/x.umd.js".to_string()),
            ..ManifestRecord::default()
        };
        assert!(unpkg.capabilities().unpkg);
        assert!(unpkg.capabilities().any());
    }

    #[test]
    fn test_read_manifest_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            read_manifest(&path),
            Err(Error::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_scan_manifests() {
        let dir = tempdir().unwrap();
        let nm = dir.path().join("node_modules");
        write_pkg(&nm.join("a"), r#"{"name": "a", "main": "a.js"}"#);
        write_pkg(&nm.join("@s").join("b"), r#"{"name": "@s/b"}"#);
        write_pkg(
            &nm.join("a").join("node_modules").join("c"),
            r#"{"name": "c"}"#,
        );
        // Fixture manifests inside a package are not installed packages.
        write_pkg(&nm.join("a").join("test").join("fixture"), r#"{"name": "f"}"#);
        write_pkg(&nm.join("broken"), "{");

        let lookup = scan_manifests(dir.path());
        assert_eq!(lookup.len(), 3);
        assert_eq!(
            lookup[&nm.join("a").join("package.json")].main.as_deref(),
            Some("a.js")
        );
        assert!(lookup.contains_key(&nm.join("@s").join("b").join("package.json")));
        assert!(lookup.contains_key(
            &nm.join("a").join("node_modules").join("c").join("package.json")
        ));
    }

    #[test]
    fn test_scan_without_node_modules() {
        let dir = tempdir().unwrap();
        assert!(scan_manifests(dir.path()).is_empty());
    }

    #[test]
    fn test_is_installed_package_dir() {
        let root = Path::new("/p");
        assert!(is_installed_package_dir(root, Path::new("/p/node_modules/a")));
        assert!(is_installed_package_dir(root, Path::new("/p/node_modules/@s/b")));
        assert!(is_installed_package_dir(
            root,
            Path::new("/p/node_modules/a/node_modules/b")
        ));
        assert!(!is_installed_package_dir(root, Path::new("/p/node_modules/@s")));
        assert!(!is_installed_package_dir(root, Path::new("/p/node_modules/a/lib")));
        assert!(!is_installed_package_dir(root, Path::new("/p")));
    }
}
