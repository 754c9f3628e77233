//! Require discovery for package sources.
//!
//! A lexical scanner, not a parser: it reports the specifiers a file
//! references, or an [`ExtractError`] when the text cannot be tokenized.
//! Callers treat a failed scan as a leaf file.

mod scan;

pub use scan::{scan_requires, ExtractError, RequireKind, RequireSpec};

/// Extract the ordered, deduplicated specifiers referenced by `source`.
pub fn extract_requires(source: &str) -> Result<Vec<String>, ExtractError> {
    Ok(scan_requires(source)?.into_iter().map(|s| s.raw).collect())
}
