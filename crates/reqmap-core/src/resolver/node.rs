//! Node-style resolution with browser-field aliasing.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`, `.`, `..`
//! - Absolute filesystem specifiers
//! - Bare specifiers with `node_modules` lookup (scoped packages, subpaths)
//! - Extension probing from a configured candidate list
//! - Directory resolution (entry fields in precedence order, then index file)
//! - `browser` object maps: specifier/file replacement and `false` ignores

use super::browser::{self, BrowserAlias};
use super::pkg_json_cache::PkgJsonCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default extensions for probing.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".json"];

/// Default manifest fields consulted for a package entry, in order.
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["browser", "main"];

/// Default directory index file stem.
pub const DEFAULT_INDEX_FILE: &str = "index";

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Resolution conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Extensions appended when the literal path does not exist (in order).
    pub extensions: Vec<String>,
    /// Manifest fields naming a package's entry file (in precedence order).
    /// Only string values are used.
    pub main_fields: Vec<String>,
    /// File stem probed inside directories.
    pub index_file: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            main_fields: DEFAULT_MAIN_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

/// Context for resolution.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    /// Directory containing the requiring file.
    pub parent: PathBuf,
    /// Resolver configuration.
    pub config: &'a ResolverConfig,
    /// Optional parsed `package.json` cache.
    pub pkg_json_cache: Option<&'a dyn PkgJsonCache>,
}

impl<'a> ResolveContext<'a> {
    /// Context for resolving specifiers written in `file`.
    #[must_use]
    pub fn for_file(file: &Path, config: &'a ResolverConfig) -> Self {
        Self {
            parent: file.parent().map_or_else(|| PathBuf::from("/"), Path::to_path_buf),
            config,
            pkg_json_cache: None,
        }
    }

    #[must_use]
    pub fn with_pkg_json_cache(mut self, cache: &'a dyn PkgJsonCache) -> Self {
        self.pkg_json_cache = Some(cache);
        self
    }

    fn read_package_json(&self, path: &Path) -> Option<std::sync::Arc<Value>> {
        browser::read_package_json(path, self.pkg_json_cache)
    }

    fn enclosing_package(&self, dir: &Path) -> Option<(PathBuf, std::sync::Arc<Value>)> {
        browser::enclosing_package(dir, self.pkg_json_cache)
    }
}

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Resolved,
    /// A `browser` map entry set the target to `false`.
    Ignored,
    Unresolved,
}

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReasonCode {
    SpecifierInvalid,
    UnsupportedScheme,
    NotFound,
    IsDirectory,
    NodeModulesNotFound,
}

impl std::fmt::Display for ResolveReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::NotFound => "NOT_FOUND",
            Self::IsDirectory => "IS_DIRECTORY",
            Self::NodeModulesNotFound => "NODE_MODULES_NOT_FOUND",
        };
        write!(f, "{s}")
    }
}

/// Resolution result.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Resolved canonical path (if successful).
    pub resolved: Option<PathBuf>,
    pub status: ResolveStatus,
    /// Reason code if unresolved.
    pub reason: Option<ResolveReasonCode>,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl ResolveResult {
    fn resolved(path: PathBuf, tried: Vec<PathBuf>) -> Self {
        Self {
            resolved: Some(path),
            status: ResolveStatus::Resolved,
            reason: None,
            tried,
        }
    }

    fn ignored(tried: Vec<PathBuf>) -> Self {
        Self {
            resolved: None,
            status: ResolveStatus::Ignored,
            reason: None,
            tried,
        }
    }

    fn unresolved(reason: ResolveReasonCode, tried: Vec<PathBuf>) -> Self {
        Self {
            resolved: None,
            status: ResolveStatus::Unresolved,
            reason: Some(reason),
            tried,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }
}

/// Resolve a specifier written in the file whose directory is `ctx.parent`.
#[must_use]
pub fn resolve(ctx: &ResolveContext<'_>, spec: &str) -> ResolveResult {
    let mut tried = Vec::new();

    if spec.is_empty() {
        return ResolveResult::unresolved(ResolveReasonCode::SpecifierInvalid, tried);
    }

    if spec.contains("://") || spec.starts_with("node:") || spec.starts_with("data:") {
        return ResolveResult::unresolved(ResolveReasonCode::UnsupportedScheme, tried);
    }

    // The requiring package may alias bare specifiers in its browser map.
    if is_bare(spec) {
        if let Some((pkg_dir, pkg_json)) = ctx.enclosing_package(&ctx.parent) {
            match browser::lookup(&pkg_json, spec) {
                Some(BrowserAlias::Ignore) => return ResolveResult::ignored(tried),
                Some(BrowserAlias::Replace(target)) if is_relative(&target) => {
                    let result = resolve_path(ctx, &pkg_dir.join(&target), &mut tried);
                    return apply_file_alias(ctx, result, &mut tried);
                }
                Some(BrowserAlias::Replace(target)) if target != spec => {
                    let result = resolve_bare(ctx, &target, &mut tried);
                    return apply_file_alias(ctx, result, &mut tried);
                }
                _ => {}
            }
        }
    }

    let result = if is_relative(spec) {
        resolve_path(ctx, &ctx.parent.join(spec), &mut tried)
    } else if is_absolute_path(spec) {
        resolve_path(ctx, Path::new(spec), &mut tried)
    } else {
        resolve_bare(ctx, spec, &mut tried)
    };

    apply_file_alias(ctx, result, &mut tried)
}

/// Resolve an entry path that may omit its extension or name a directory.
///
/// `ctx.parent` is not consulted.
#[must_use]
pub fn resolve_entry(ctx: &ResolveContext<'_>, path: &Path) -> ResolveResult {
    let mut tried = Vec::new();
    let result = resolve_path(ctx, path, &mut tried);
    apply_file_alias(ctx, result, &mut tried)
}

fn is_relative(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

fn is_bare(spec: &str) -> bool {
    !is_relative(spec) && !is_absolute_path(spec)
}

/// Check if a specifier is an absolute path.
fn is_absolute_path(spec: &str) -> bool {
    if spec.starts_with('/') || spec.starts_with("\\\\") {
        return true;
    }

    // Windows absolute: C:\, D:/
    let bytes = spec.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Apply the resolved file's own package `browser` map, if any.
///
/// Replacement targets are resolved once; they are not aliased again.
fn apply_file_alias(
    ctx: &ResolveContext<'_>,
    result: ResolveResult,
    tried: &mut Vec<PathBuf>,
) -> ResolveResult {
    let Some(resolved) = result.resolved.as_deref() else {
        return result;
    };
    let Some(dir) = resolved.parent() else {
        return result;
    };
    let Some((pkg_dir, pkg_json)) = ctx.enclosing_package(dir) else {
        return result;
    };

    match browser::lookup_file(&pkg_json, &pkg_dir, resolved, &ctx.config.extensions) {
        Some(BrowserAlias::Ignore) => ResolveResult::ignored(tried.clone()),
        Some(BrowserAlias::Replace(target)) => {
            let replaced = resolve_path(ctx, &pkg_dir.join(&target), tried);
            if replaced.is_resolved() {
                replaced
            } else {
                result
            }
        }
        None => result,
    }
}

/// `base` with `ext` appended (not substituted): `foo.min` + `.js` = `foo.min.js`.
fn with_appended_ext(base: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Try `base` as a file, then with each extension appended.
fn resolve_file(config: &ResolverConfig, base: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    add_tried(tried, base);
    if base.is_file() {
        return Some(canonical(base));
    }

    for ext in &config.extensions {
        let with_ext = with_appended_ext(base, ext);
        add_tried(tried, &with_ext);
        if with_ext.is_file() {
            return Some(canonical(&with_ext));
        }
    }

    None
}

/// Resolve a path (file, then extension probing, then directory).
fn resolve_path(ctx: &ResolveContext<'_>, base: &Path, tried: &mut Vec<PathBuf>) -> ResolveResult {
    if let Some(found) = resolve_file(ctx.config, base, tried) {
        return ResolveResult::resolved(found, tried.clone());
    }

    resolve_directory(ctx, base, tried)
}

/// Resolve a directory (entry fields in precedence order, then index file).
fn resolve_directory(
    ctx: &ResolveContext<'_>,
    dir: &Path,
    tried: &mut Vec<PathBuf>,
) -> ResolveResult {
    let config = ctx.config;
    if !dir.is_dir() {
        return ResolveResult::unresolved(ResolveReasonCode::NotFound, tried.clone());
    }

    let pkg_json_path = dir.join("package.json");
    if pkg_json_path.is_file() {
        add_tried(tried, &pkg_json_path);

        if let Some(pkg_json) = ctx.read_package_json(&pkg_json_path) {
            for field in &config.main_fields {
                let Some(entry) = pkg_json.get(field).and_then(Value::as_str) else {
                    continue;
                };
                if entry.is_empty() {
                    continue;
                }
                let entry_path = dir.join(entry);
                if let Some(found) = resolve_file(config, &entry_path, tried) {
                    return ResolveResult::resolved(found, tried.clone());
                }
                if entry_path.is_dir() {
                    if let Some(found) = resolve_index(config, &entry_path, tried) {
                        return ResolveResult::resolved(found, tried.clone());
                    }
                }
            }
        }
    }

    if let Some(found) = resolve_index(config, dir, tried) {
        return ResolveResult::resolved(found, tried.clone());
    }

    ResolveResult::unresolved(ResolveReasonCode::IsDirectory, tried.clone())
}

fn resolve_index(config: &ResolverConfig, dir: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    for ext in &config.extensions {
        let index = dir.join(format!("{}{ext}", config.index_file));
        add_tried(tried, &index);
        if index.is_file() {
            return Some(canonical(&index));
        }
    }
    None
}

/// Resolve a bare specifier via `node_modules`, walking up from `ctx.parent`.
fn resolve_bare(ctx: &ResolveContext<'_>, spec: &str, tried: &mut Vec<PathBuf>) -> ResolveResult {
    let (pkg_name, subpath) = parse_bare_specifier(spec);
    if pkg_name.is_empty() || pkg_name == "@" {
        return ResolveResult::unresolved(ResolveReasonCode::SpecifierInvalid, tried.clone());
    }

    let mut found_node_modules = false;
    let mut current = Some(ctx.parent.as_path());

    while let Some(dir) = current {
        current = dir.parent();

        // Never look for node_modules/node_modules.
        if dir.file_name().is_some_and(|n| n == "node_modules") {
            continue;
        }

        let node_modules = dir.join("node_modules");
        if !node_modules.is_dir() {
            continue;
        }
        found_node_modules = true;

        let pkg_dir = node_modules.join(pkg_name);
        add_tried(tried, &pkg_dir);
        if !pkg_dir.is_dir() {
            continue;
        }

        let result = match subpath {
            Some(sub) if !sub.is_empty() => resolve_path(ctx, &pkg_dir.join(sub), tried),
            _ => resolve_directory(ctx, &pkg_dir, tried),
        };
        if result.is_resolved() {
            return result;
        }
    }

    if found_node_modules {
        ResolveResult::unresolved(ResolveReasonCode::NotFound, tried.clone())
    } else {
        ResolveResult::unresolved(ResolveReasonCode::NodeModulesNotFound, tried.clone())
    }
}

/// Parse a bare specifier into package name and optional subpath.
///
/// `lodash/fp` gives `("lodash", Some("fp"))`, `@scope/pkg/sub` gives
/// `("@scope/pkg", Some("sub"))`.
pub(crate) fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let name_end = if spec.starts_with('@') {
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };

    match name_end {
        Some(i) => (&spec[..i], Some(&spec[i + 1..])),
        None => (spec, None),
    }
}

/// Add a path to tried list (with cap).
fn add_tried(tried: &mut Vec<PathBuf>, path: &Path) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_path_buf());
    }
}
