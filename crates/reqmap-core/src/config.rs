use crate::error::{Error, Result};
use crate::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the optional config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "reqmap.json";

/// Serialized length above which an entry-ambiguous package map is dropped
/// (8 Mi UTF-16 code units).
pub const DEFAULT_SIZE_LIMIT: u64 = 8 * 1024 * 1024;

/// File extensions whose contents are scanned for requires.
pub const DEFAULT_SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs"];

/// Configuration for a package walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution conventions (extensions, entry fields, index name).
    pub resolver: ResolverConfig,

    /// Extensions treated as script files. Anything else is a leaf.
    pub script_extensions: Vec<String>,

    /// Size guard threshold, in UTF-16 code units of the serialized map.
    #[serde(alias = "size_limit_bytes")]
    pub size_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            script_extensions: DEFAULT_SCRIPT_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

impl Config {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `reqmap.json` from `root` if present, otherwise the defaults.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Override the size guard threshold.
    #[must_use]
    pub fn with_size_limit(mut self, limit: u64) -> Self {
        self.size_limit = limit;
        self
    }

    /// Whether `path` has one of the configured script extensions.
    #[must_use]
    pub fn is_script(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.script_extensions
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.size_limit, 8 * 1024 * 1024);
        assert_eq!(config.resolver.index_file, "index");
        assert!(config.script_extensions.contains(&".js".to_string()));
    }

    #[test]
    fn test_is_script() {
        let config = Config::default();
        assert!(config.is_script(Path::new("/p/index.js")));
        assert!(config.is_script(Path::new("/p/esm/index.mjs")));
        assert!(!config.is_script(Path::new("/p/style.css")));
        assert!(!config.is_script(Path::new("/p/data.json")));
        assert!(!config.is_script(Path::new("/p/.js")));
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reqmap.json");
        fs::write(&path, r#"{"size_limit": 1024}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.size_limit, 1024);
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[test]
    fn test_load_resolver_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reqmap.json");
        fs::write(
            &path,
            r#"{"resolver": {"extensions": [".re", ".js"], "main_fields": ["main"]}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.resolver.extensions, vec![".re", ".js"]);
        assert_eq!(config.resolver.main_fields, vec!["main"]);
        assert_eq!(config.resolver.index_file, "index");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reqmap.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_discover_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }
}
