#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Flat file maps of everything a package's entry files reach.

pub mod config;
pub mod entries;
pub mod error;
pub mod extract;
pub mod find;
pub mod guard;
pub mod manifest;
pub mod paths;
pub mod resolver;
pub mod seed;
pub mod version;
pub mod walk;

pub use config::Config;
pub use entries::{EntryResolver, ManifestEntryResolver};
pub use error::{Error, Result};
pub use extract::{extract_requires, scan_requires, ExtractError, RequireKind, RequireSpec};
pub use find::{find_requires, find_requires_batch, FindOptions, FindResult};
pub use guard::{finalize, Finalized, GuardOutcome};
pub use manifest::{scan_manifests, EntryCapabilities, ManifestLookup, ManifestRecord, PackageContext};
pub use resolver::{
    resolve, resolve_entry, MemoryPkgJsonCache, PkgJsonCache, ResolveContext, ResolveReasonCode,
    ResolveResult, ResolveStatus, ResolverConfig,
};
pub use seed::{NoSeeder, ReasonSeeder, Seeder};
pub use version::VERSION;
pub use walk::{FileMap, FileRecord, UnresolvedEdge, WalkReport, Walker};
