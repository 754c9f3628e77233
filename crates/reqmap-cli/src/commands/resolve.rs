//! `reqmap resolve` command implementation.

use miette::{IntoDiagnostic, Result};
use reqmap_core::{resolve, Config, ResolveContext, ResolveStatus};
use std::path::Path;

pub fn run(specifier: &str, from: &Path, config: &Config, json: bool) -> Result<()> {
    let from = dunce::canonicalize(from).unwrap_or_else(|_| from.to_path_buf());
    let ctx = ResolveContext::for_file(&from, &config.resolver);
    let result = resolve(&ctx, specifier);
    let tried: Vec<String> = result
        .tried
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    match (result.status, &result.resolved) {
        (ResolveStatus::Resolved, Some(path)) => {
            if json {
                let out = serde_json::json!({
                    "ok": true,
                    "specifier": specifier,
                    "status": "resolved",
                    "resolved": path.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
            } else {
                println!("{}", path.display());
            }
        }
        (ResolveStatus::Ignored, _) => {
            if json {
                let out = serde_json::json!({
                    "ok": true,
                    "specifier": specifier,
                    "status": "ignored",
                    "resolved": null,
                });
                println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
            } else {
                println!("(ignored by browser map)");
            }
        }
        _ => {
            let code = result
                .reason
                .map_or_else(|| "NOT_FOUND".to_string(), |r| r.to_string());
            if json {
                let out = serde_json::json!({
                    "ok": false,
                    "specifier": specifier,
                    "error": {
                        "code": code,
                        "message": format!("Cannot resolve '{specifier}' from {}", from.display()),
                    },
                    "tried": tried,
                });
                println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
            } else {
                eprintln!("error: cannot resolve '{specifier}' [{code}]");
                for path in &tried {
                    eprintln!("  tried {path}");
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
