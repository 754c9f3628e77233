//! `reqmap find` command implementation.
//!
//! Prints the root-relative file map of one installed package, or with
//! `--report` a summary of the walk.

use super::Project;
use miette::{IntoDiagnostic, Result};
use reqmap_core::{
    find_requires, scan_manifests, FileRecord, FindOptions, FindResult, GuardOutcome,
};
use reqmap_util::fs::write_atomic;
use reqmap_util::hash::fingerprint_pairs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

pub fn run(
    project: &Project,
    package: &str,
    report: bool,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let span = tracing::info_span!("find", package = package, root = %project.root.display());
    let _guard = span.enter();

    let manifests = scan_manifests(&project.root);
    let options = FindOptions::default().with_config(project.config.clone());
    let result = find_requires(package, &project.root, &manifests, &options);

    if report {
        let summary = FindReport::new(package, project, &result)?;
        return if json {
            print_json(&summary)
        } else {
            print_human(&summary)
        };
    }

    let rendered = serde_json::to_string_pretty(&result.files).into_diagnostic()?;
    match out {
        Some(path) => {
            write_atomic(path, rendered.as_bytes()).into_diagnostic()?;
            info!(path = %path.display(), files = result.files.len(), "wrote file map");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FindReport<'a> {
    package: &'a str,
    root: String,
    outcome: &'static str,
    files: usize,
    size: u64,
    ignored: usize,
    unresolved: Vec<UnresolvedOutput>,
    extraction_failures: Vec<String>,
    unreadable: Vec<String>,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct UnresolvedOutput {
    from: String,
    specifier: String,
    reason: String,
}

impl<'a> FindReport<'a> {
    fn new(package: &'a str, project: &Project, result: &FindResult) -> Result<Self> {
        let outcome = result
            .outcome
            .map_or("missing_manifest", GuardOutcome::as_str);
        Ok(Self {
            package,
            root: project.root.display().to_string(),
            outcome,
            files: result.files.len(),
            size: result.size,
            ignored: result.report.ignored,
            unresolved: result
                .report
                .unresolved
                .iter()
                .map(|e| UnresolvedOutput {
                    from: e.from.display().to_string(),
                    specifier: e.specifier.clone(),
                    reason: e.reason.to_string(),
                })
                .collect(),
            extraction_failures: result
                .report
                .extraction_failures
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            unreadable: result.report.unreadable.iter().map(|p| p.display().to_string()).collect(),
            fingerprint: fingerprint(&result.files)?,
        })
    }
}

/// BLAKE3 over each output key and its serialized record.
fn fingerprint(files: &BTreeMap<String, FileRecord>) -> Result<String> {
    let encoded = files
        .iter()
        .map(|(key, record)| Ok((key.as_str(), serde_json::to_vec(record).into_diagnostic()?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(fingerprint_pairs(
        encoded.iter().map(|(key, bytes)| (*key, bytes.as_slice())),
    ))
}

fn print_json(report: &FindReport<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn print_human(report: &FindReport<'_>) -> Result<()> {
    let mut out = io::stdout().lock();

    writeln!(out, "Package:      {}", report.package).into_diagnostic()?;
    writeln!(out, "Root:         {}", report.root).into_diagnostic()?;
    writeln!(out, "Outcome:      {}", report.outcome).into_diagnostic()?;
    writeln!(out, "Files:        {}", report.files).into_diagnostic()?;
    writeln!(
        out,
        "Size:         {} UTF-16 units ({:.2} Mi)",
        report.size,
        report.size as f64 / 1024.0 / 1024.0
    )
    .into_diagnostic()?;
    writeln!(out, "Fingerprint:  {}", report.fingerprint).into_diagnostic()?;

    if report.ignored > 0 {
        writeln!(out, "Ignored:      {} (browser map)", report.ignored).into_diagnostic()?;
    }

    if !report.unresolved.is_empty() {
        writeln!(out, "\nUnresolved ({}):", report.unresolved.len()).into_diagnostic()?;
        for edge in &report.unresolved {
            writeln!(
                out,
                "  {} -> {} [{}]",
                edge.from, edge.specifier, edge.reason
            )
            .into_diagnostic()?;
        }
    }

    if !report.extraction_failures.is_empty() {
        writeln!(out, "\nNot scanned:").into_diagnostic()?;
        for path in &report.extraction_failures {
            writeln!(out, "  {path}").into_diagnostic()?;
        }
    }

    if !report.unreadable.is_empty() {
        writeln!(out, "\nUnreadable:").into_diagnostic()?;
        for path in &report.unreadable {
            writeln!(out, "  {path}").into_diagnostic()?;
        }
    }

    Ok(())
}
