pub mod batch;
pub mod extract;
pub mod find;
pub mod resolve;
pub mod version;

use miette::{IntoDiagnostic, Result};
use reqmap_core::paths::project_root;
use reqmap_core::Config;
use std::path::{Path, PathBuf};

/// Command-line overrides for project discovery.
#[derive(Debug, Default)]
pub struct ProjectOverrides {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub size_limit: Option<u64>,
}

/// A project root and its effective configuration.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Locate the root and load config, applying overrides.
    ///
    /// Without `--root`, the nearest directory above `cwd` holding
    /// `node_modules` or `package.json` is used, falling back to `cwd`.
    pub fn load(cwd: &Path, overrides: ProjectOverrides) -> Result<Self> {
        let root = match overrides.root {
            Some(root) => absolutize(cwd, &root),
            None => project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        };

        let config = match overrides.config {
            Some(path) => Config::load(&absolutize(cwd, &path)).into_diagnostic()?,
            None => Config::discover(&root).into_diagnostic()?,
        };
        let config = match overrides.size_limit {
            Some(limit) => config.with_size_limit(limit),
            None => config,
        };

        tracing::debug!(root = %root.display(), "project loaded");
        Ok(Self { root, config })
    }

    /// Config of the project enclosing `file`, or the defaults.
    pub fn discover_config(file: &Path) -> Result<Config> {
        let dir = file.parent().unwrap_or(file);
        match project_root(dir) {
            Some(root) => Config::discover(&root).into_diagnostic(),
            None => Ok(Config::default()),
        }
    }
}

/// Join relative paths onto `cwd`.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
