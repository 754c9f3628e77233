//! Final size policy and key relativization.

use crate::manifest::EntryCapabilities;
use crate::paths::relativize;
use crate::walk::{FileMap, FileRecord};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// What the guard did with a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Keys were relativized and every record kept.
    Kept,
    /// The map was oversized with no declared entry and was dropped.
    Degraded,
}

impl GuardOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kept => "kept",
            Self::Degraded => "degraded",
        }
    }
}

/// A finalized file map, keyed by root-relative path.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub files: BTreeMap<String, FileRecord>,
    pub outcome: GuardOutcome,
    /// Serialized length of the absolute map, in UTF-16 code units.
    pub size: u64,
}

/// Apply the size policy to a finished walk.
///
/// A map whose serialized length exceeds `limit` is discarded when the
/// manifest declares none of `main`, `module` or `unpkg`; consumers then
/// fetch files on demand. Otherwise every key is made relative to `root`.
#[must_use]
pub fn finalize(
    map: FileMap,
    capabilities: EntryCapabilities,
    root: &Path,
    limit: u64,
) -> Finalized {
    let size = serialized_size(&map);

    if size > limit && !capabilities.any() {
        info!(
            size,
            limit,
            files = map.len(),
            "file map too large without a declared entry, dropping"
        );
        return Finalized {
            files: BTreeMap::new(),
            outcome: GuardOutcome::Degraded,
            size,
        };
    }

    let files: BTreeMap<String, FileRecord> = map
        .into_records()
        .into_iter()
        .map(|record| (relativize(&record.path, root), record))
        .collect();

    info!(size, files = files.len(), "file map kept");
    Finalized {
        files,
        outcome: GuardOutcome::Kept,
        size,
    }
}

/// JSON length of `map` in UTF-16 code units, without materializing the
/// output.
fn serialized_size(map: &FileMap) -> u64 {
    let mut counter = Utf16Counter(0);
    if let Err(e) = serde_json::to_writer(&mut counter, map) {
        warn!(error = %e, "failed to measure file map");
    }
    counter.0
}

/// Counts UTF-16 code units of the UTF-8 written to it.
///
/// Every lead byte is one unit and a 4-byte lead adds a second (surrogate
/// pair). Continuation bytes count nothing, so a sequence split across
/// writes is still counted once.
struct Utf16Counter(u64);

impl io::Write for Utf16Counter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            if b & 0xC0 != 0x80 {
                self.0 += 1;
            }
            if b >= 0xF0 {
                self.0 += 1;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
