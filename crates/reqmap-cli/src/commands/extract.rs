//! `reqmap extract` command implementation.

use miette::{IntoDiagnostic, Result};
use reqmap_core::scan_requires;
use reqmap_util::fs::read_to_string_lossy;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let source = read_to_string_lossy(file).into_diagnostic()?;

    let specs = match scan_requires(&source) {
        Ok(specs) => specs,
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": {
                            "code": "EXTRACT_FAILED",
                            "message": e.to_string(),
                        }
                    })
                );
            } else {
                eprintln!("error: {}: {e}", file.display());
            }
            std::process::exit(1);
        }
    };

    if json {
        let requires: Vec<serde_json::Value> = specs
            .iter()
            .map(|s| {
                serde_json::json!({
                    "specifier": s.raw,
                    "kind": s.kind.as_str(),
                    "line": s.line,
                })
            })
            .collect();
        let out = serde_json::json!({ "ok": true, "requires": requires });
        println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
    } else {
        for spec in &specs {
            println!("{}\t{}\t{}", spec.line, spec.kind.as_str(), spec.raw);
        }
    }

    Ok(())
}
