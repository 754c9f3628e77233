//! `package.json` reading and `browser` field aliasing.
//!
//! The object form of `browser` maps either bare specifiers
//! (`{"fs": false}`) or package-relative files
//! (`{"./lib/node.js": "./lib/browser.js"}`) to a replacement, or to
//! `false` to drop the dependency in browser builds.

use super::pkg_json_cache::PkgJsonCache;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A `browser` map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAlias {
    /// Use this specifier (bare) or package-relative path instead.
    Replace(String),
    /// The dependency is dropped.
    Ignore,
}

/// Read and parse a `package.json`, using `cache` if given.
///
/// Unreadable or invalid files yield `None` and are not cached.
#[must_use]
pub fn read_package_json(path: &Path, cache: Option<&dyn PkgJsonCache>) -> Option<Arc<Value>> {
    if let Some(value) = cache.and_then(|c| c.get(path)) {
        return Some(value);
    }

    let content = std::fs::read_to_string(path).ok()?;
    let value: Arc<Value> = Arc::new(serde_json::from_str(&content).ok()?);

    if let Some(c) = cache {
        c.set(path, Arc::clone(&value));
    }
    Some(value)
}

/// Find the nearest `package.json` at or above `dir`.
///
/// Returns the package directory and the parsed manifest.
#[must_use]
pub fn enclosing_package(
    dir: &Path,
    cache: Option<&dyn PkgJsonCache>,
) -> Option<(PathBuf, Arc<Value>)> {
    let mut current = Some(dir);

    while let Some(d) = current {
        // A node_modules directory is never itself a package.
        if d.file_name().is_some_and(|n| n == "node_modules") {
            return None;
        }
        let pkg_json_path = d.join("package.json");
        if pkg_json_path.is_file() {
            return read_package_json(&pkg_json_path, cache).map(|v| (d.to_path_buf(), v));
        }
        current = d.parent();
    }

    None
}

/// Look up `key` in the object form of the manifest's `browser` field.
#[must_use]
pub fn lookup(pkg_json: &Value, key: &str) -> Option<BrowserAlias> {
    let map = pkg_json.get("browser")?.as_object()?;
    match map.get(key)? {
        Value::Bool(false) => Some(BrowserAlias::Ignore),
        Value::String(target) => Some(BrowserAlias::Replace(target.clone())),
        _ => None,
    }
}

/// Look up a resolved file in its package's `browser` map.
///
/// Keys are matched as `./rel/path.js`, then without the extension when the
/// extension is one of `extensions`.
#[must_use]
pub fn lookup_file(
    pkg_json: &Value,
    pkg_dir: &Path,
    file: &Path,
    extensions: &[String],
) -> Option<BrowserAlias> {
    pkg_json.get("browser")?.as_object()?;

    let pkg_dir = dunce::canonicalize(pkg_dir).unwrap_or_else(|_| pkg_dir.to_path_buf());
    let rel = file.strip_prefix(&pkg_dir).ok()?;
    let rel = rel.to_string_lossy().replace('\\', "/");
    let key = format!("./{rel}");

    if let Some(alias) = lookup(pkg_json, &key) {
        return Some(alias);
    }

    extensions
        .iter()
        .find_map(|ext| key.strip_suffix(ext.as_str()))
        .and_then(|stem| lookup(pkg_json, stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::pkg_json_cache::MemoryPkgJsonCache;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_variants() {
        let pkg = json!({"browser": {"fs": false, "path": "path-browserify", "x": 1}});
        assert_eq!(lookup(&pkg, "fs"), Some(BrowserAlias::Ignore));
        assert_eq!(
            lookup(&pkg, "path"),
            Some(BrowserAlias::Replace("path-browserify".to_string()))
        );
        assert_eq!(lookup(&pkg, "x"), None);
        assert_eq!(lookup(&pkg, "os"), None);
    }

    #[test]
    fn test_lookup_string_browser_field() {
        let pkg = json!({"browser": "dist/browser.js"});
        assert_eq!(lookup(&pkg, "fs"), None);
    }

    #[test]
    fn test_lookup_file_with_and_without_extension() {
        let dir = tempdir().unwrap();
        let pkg_dir = dunce::canonicalize(dir.path()).unwrap();
        let file = pkg_dir.join("lib").join("node.js");
        let exts = vec![".js".to_string()];

        let exact = json!({"browser": {"./lib/node.js": "./lib/b.js"}});
        assert_eq!(
            lookup_file(&exact, &pkg_dir, &file, &exts),
            Some(BrowserAlias::Replace("./lib/b.js".to_string()))
        );

        let stem = json!({"browser": {"./lib/node": false}});
        assert_eq!(
            lookup_file(&stem, &pkg_dir, &file, &exts),
            Some(BrowserAlias::Ignore)
        );
    }

    #[test]
    fn test_enclosing_package() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("a");
        let nested = pkg.join("lib").join("util");
        fs::create_dir_all(&nested).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name": "a"}"#).unwrap();

        let (found_dir, value) = enclosing_package(&nested, None).unwrap();
        assert_eq!(found_dir, pkg);
        assert_eq!(value["name"], "a");
    }

    #[test]
    fn test_enclosing_package_stops_at_node_modules() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "root"}"#).unwrap();
        let pkg = dir.path().join("node_modules").join("bare");
        fs::create_dir_all(&pkg).unwrap();

        assert!(enclosing_package(&pkg, None).is_none());
    }

    #[test]
    fn test_read_package_json_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{oops").unwrap();
        assert!(read_package_json(&path, None).is_none());
    }

    #[test]
    fn test_read_package_json_parses_once_with_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{"name": "first"}"#).unwrap();

        let cache = MemoryPkgJsonCache::new();
        let first = read_package_json(&path, Some(&cache)).unwrap();
        assert_eq!(first["name"], "first");

        // Served from the cache, not the file.
        fs::write(&path, r#"{"name": "second"}"#).unwrap();
        let again = read_package_json(&path, Some(&cache)).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(read_package_json(&path, None).unwrap()["name"], "second");
    }

    #[test]
    fn test_invalid_manifest_is_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{oops").unwrap();

        let cache = MemoryPkgJsonCache::new();
        assert!(read_package_json(&path, Some(&cache)).is_none());
        assert!(cache.is_empty());
    }
}
