//! `reqmap batch` command implementation.

use super::Project;
use miette::{IntoDiagnostic, Result};
use reqmap_core::{find_requires_batch, scan_manifests, FileRecord, FindOptions};
use std::collections::BTreeMap;

/// Print `{package: file map}` for every requested package.
///
/// The manifest scan is shared; each package is walked on its own thread.
pub fn run(project: &Project, packages: &[String]) -> Result<()> {
    let manifests = scan_manifests(&project.root);
    let options = FindOptions::default().with_config(project.config.clone());
    let results = find_requires_batch(packages, &project.root, &manifests, &options);

    let output: BTreeMap<&str, &BTreeMap<String, FileRecord>> = results
        .iter()
        .map(|(name, result)| (name.as_str(), &result.files))
        .collect();

    let json = serde_json::to_string_pretty(&output).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
