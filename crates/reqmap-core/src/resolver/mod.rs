//! Module path resolver.
//!
//! Maps a specifier written in a file to the concrete file it loads.
//! Conventions (candidate extensions, entry-field precedence, index file)
//! are declared in [`ResolverConfig`] rather than hard-coded per ecosystem.

pub mod browser;
mod node;
mod pkg_json_cache;

pub use browser::BrowserAlias;
pub use pkg_json_cache::{MemoryPkgJsonCache, PkgJsonCache};
pub use node::{
    resolve, resolve_entry, ResolveContext, ResolveReasonCode, ResolveResult, ResolveStatus,
    ResolverConfig, DEFAULT_EXTENSIONS, DEFAULT_INDEX_FILE, DEFAULT_MAIN_FIELDS,
};
