use std::path::{Path, PathBuf};

/// Find the project root by walking up from `cwd` looking for `node_modules`
/// or `package.json`.
///
/// Returns the first directory containing either marker, or `None`.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join("node_modules").is_dir() || current.join("package.json").is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Directory of an installed package: `{root}/node_modules/{name}`.
///
/// Scoped names (`@scope/pkg`) map to nested directories.
#[must_use]
pub fn package_dir(root: &Path, package_name: &str) -> PathBuf {
    let mut dir = root.join("node_modules");
    for part in package_name.split('/') {
        dir.push(part);
    }
    dir
}

/// Path of an installed package's manifest.
#[must_use]
pub fn manifest_path(root: &Path, package_name: &str) -> PathBuf {
    package_dir(root, package_name).join("package.json")
}

/// Render `path` relative to `root`, keeping the leading separator.
///
/// `/proj` + `/proj/node_modules/a/index.js` gives `/node_modules/a/index.js`,
/// so `root + key` reproduces the absolute path. Paths outside `root` are
/// returned unchanged.
#[must_use]
pub fn relativize(path: &Path, root: &Path) -> String {
    let full = to_slash(path);
    let root = to_slash(root);
    let root = root.trim_end_matches('/');

    match full.strip_prefix(root) {
        Some(rest) if root.is_empty() || rest.is_empty() || rest.starts_with('/') => {
            rest.to_string()
        }
        _ => full,
    }
}

/// Path as a forward-slash string.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}
