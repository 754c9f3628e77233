//! Pre-built file maps for packages the require walk cannot cover.
//!
//! Reason/BuckleScript packages ship sources the consumer compiles itself,
//! so their `.re`/`.ml` files and build config are collected wholesale.

use crate::error::Result;
use crate::manifest::ManifestLookup;
use crate::paths::package_dir;
use crate::walk::{FileMap, FileRecord};
use reqmap_util::fs::read_to_string_lossy;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// BuckleScript build config marking a Reason package.
pub const BSCONFIG_FILE: &str = "bsconfig.json";

const REASON_EXTENSIONS: &[&str] = &["re", "rei", "ml", "mli"];

/// Supplies the starting map for a package walk.
pub trait Seeder: Send + Sync {
    /// Whether `package_name` under `root` needs seeding.
    fn matches(&self, package_name: &str, root: &Path) -> bool;

    /// Build the seed map. Paths are absolute and canonical.
    fn seed(&self, root: &Path, manifests: &ManifestLookup) -> Result<FileMap>;
}

/// Never seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeeder;

impl Seeder for NoSeeder {
    fn matches(&self, _package_name: &str, _root: &Path) -> bool {
        false
    }

    fn seed(&self, _root: &Path, _manifests: &ManifestLookup) -> Result<FileMap> {
        Ok(FileMap::new())
    }
}

/// Seeds Reason/BuckleScript sources from every installed Reason package.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReasonSeeder;

impl Seeder for ReasonSeeder {
    fn matches(&self, package_name: &str, root: &Path) -> bool {
        package_dir(root, package_name).join(BSCONFIG_FILE).is_file()
    }

    fn seed(&self, _root: &Path, manifests: &ManifestLookup) -> Result<FileMap> {
        let mut dirs: Vec<&Path> = manifests
            .keys()
            .filter_map(|manifest| manifest.parent())
            .filter(|dir| dir.join(BSCONFIG_FILE).is_file())
            .collect();
        dirs.sort();

        let mut map = FileMap::new();
        for dir in dirs {
            for path in reason_files(dir)? {
                let content = read_to_string_lossy(&path)?;
                map.insert(FileRecord::leaf(path, content));
            }
        }
        Ok(map)
    }
}

fn is_reason_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name == BSCONFIG_FILE || name == "package.json" {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| REASON_EXTENSIONS.contains(&e))
}

/// Reason sources and config of one package, skipping nested `node_modules`.
fn reason_files(package_dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(package_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != "node_modules");

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_reason_file(entry.path()) {
            files.push(dunce::canonicalize(entry.path())?);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::scan_manifests;
    use std::fs;
    use tempfile::tempdir;

    fn reason_project() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("reason-react");
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::create_dir_all(pkg.join("node_modules").join("dep")).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name": "reason-react"}"#).unwrap();
        fs::write(pkg.join(BSCONFIG_FILE), "{}").unwrap();
        fs::write(pkg.join("src").join("React.re"), "let x = 1;").unwrap();
        fs::write(pkg.join("src").join("React.rei"), "let x: int;").unwrap();
        fs::write(pkg.join("src").join("helper.js"), "").unwrap();
        fs::write(pkg.join("node_modules").join("dep").join("Dep.re"), "").unwrap();

        let plain = dir.path().join("node_modules").join("plain");
        fs::create_dir_all(&plain).unwrap();
        fs::write(plain.join("package.json"), r#"{"name": "plain"}"#).unwrap();
        fs::write(plain.join("Thing.ml"), "").unwrap();
        dir
    }

    #[test]
    fn test_reason_matches() {
        let dir = reason_project();
        assert!(ReasonSeeder.matches("reason-react", dir.path()));
        assert!(!ReasonSeeder.matches("plain", dir.path()));
        assert!(!NoSeeder.matches("reason-react", dir.path()));
    }

    #[test]
    fn test_reason_seed_collects_sources() {
        let dir = reason_project();
        let manifests = scan_manifests(dir.path());
        let map = ReasonSeeder.seed(dir.path(), &manifests).unwrap();

        let names: Vec<String> = map
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(map.len(), 4);
        assert!(names.contains(&"React.re".to_string()));
        assert!(names.contains(&"React.rei".to_string()));
        assert!(names.contains(&BSCONFIG_FILE.to_string()));
        assert!(names.contains(&"package.json".to_string()));
        assert!(map.iter().all(|r| r.requires.is_none()));
    }

    #[test]
    fn test_is_reason_file() {
        assert!(is_reason_file(Path::new("/p/a.re")));
        assert!(is_reason_file(Path::new("/p/a.mli")));
        assert!(is_reason_file(Path::new("/p/bsconfig.json")));
        assert!(!is_reason_file(Path::new("/p/a.js")));
        assert!(!is_reason_file(Path::new("/p/tsconfig.json")));
    }
}
