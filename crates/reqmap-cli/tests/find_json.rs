//! Integration tests for `reqmap find`, `batch`, `extract` and `resolve`.
//!
//! These tests create node_modules structures and check the JSON output.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "reqmap-cli", "--bin", "reqmap", "--"]);
    cmd
}

fn run(args: &[&str]) -> Output {
    cargo_bin()
        .args(args)
        .output()
        .expect("Failed to run reqmap")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

/// Create a project with node_modules populated.
///
/// `packages` are (name, package.json, files) with package-relative paths.
fn create_project(packages: &[(&str, serde_json::Value, &[(&str, &str)])]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"name": "test-project", "version": "1.0.0"}"#,
    )
    .unwrap();

    for (name, manifest, files) in packages {
        let pkg_dir = dir.path().join("node_modules").join(name);
        std::fs::create_dir_all(&pkg_dir).unwrap();
        std::fs::write(
            pkg_dir.join("package.json"),
            serde_json::to_string_pretty(manifest).unwrap(),
        )
        .unwrap();
        for (rel, content) in *files {
            let path = pkg_dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_find_prints_relative_map() {
    let project = create_project(&[(
        "a",
        serde_json::json!({"name": "a", "main": "index.js"}),
        &[
            ("index.js", "const b = require('./b');\nmodule.exports = b;"),
            ("b.js", "module.exports = 1;"),
        ],
    )]);

    let output = run(&["find", "a", "--root", path_str(project.path())]);
    assert!(
        output.status.success(),
        "Should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = stdout_json(&output);
    let files = json.as_object().expect("file map should be an object");
    assert_eq!(files.len(), 2);
    assert_eq!(
        json["/node_modules/a/index.js"]["requires"],
        serde_json::json!(["./b"])
    );
    assert_eq!(json["/node_modules/a/b.js"]["content"], "module.exports = 1;");
}

#[test]
fn test_find_uses_cwd_for_root() {
    let project = create_project(&[(
        "a",
        serde_json::json!({"name": "a"}),
        &[("index.js", "")],
    )]);

    let output = run(&["--cwd", path_str(project.path()), "find", "a"]);
    assert!(output.status.success());
    assert!(stdout_json(&output)
        .get("/node_modules/a/index.js")
        .is_some());
}

#[test]
fn test_find_missing_package_is_empty() {
    let project = create_project(&[]);

    let output = run(&["find", "ghost", "--root", path_str(project.path())]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!({}));
}

#[test]
fn test_find_report_json() {
    let project = create_project(&[(
        "a",
        serde_json::json!({"name": "a"}),
        &[("index.js", "require('./gone'); require('./gone');")],
    )]);

    let output = run(&[
        "--json",
        "find",
        "a",
        "--root",
        path_str(project.path()),
        "--report",
    ]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["package"], "a");
    assert_eq!(json["outcome"], "kept");
    assert_eq!(json["files"], 1);
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);

    let unresolved = json["unresolved"].as_array().unwrap();
    assert_eq!(unresolved.len(), 1, "duplicate specifiers are extracted once");
    assert_eq!(unresolved[0]["specifier"], "./gone");
    assert_eq!(unresolved[0]["reason"], "NOT_FOUND");
}

#[test]
fn test_find_size_limit_degrades() {
    let project = create_project(&[(
        "a",
        serde_json::json!({"name": "a"}),
        &[("index.js", "module.exports = 'some content';")],
    )]);

    let output = run(&[
        "--json",
        "find",
        "a",
        "--root",
        path_str(project.path()),
        "--size-limit",
        "8",
        "--report",
    ]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["outcome"], "degraded");
    assert_eq!(json["files"], 0);
}

#[test]
fn test_find_writes_out_file() {
    let project = create_project(&[(
        "a",
        serde_json::json!({"name": "a"}),
        &[("index.js", "")],
    )]);
    let out = project.path().join("a.json");

    let output = run(&[
        "find",
        "a",
        "--root",
        path_str(project.path()),
        "--out",
        path_str(&out),
    ]);
    assert!(output.status.success());

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert!(written.get("/node_modules/a/index.js").is_some());
}

#[test]
fn test_batch() {
    let project = create_project(&[
        ("a", serde_json::json!({"name": "a"}), &[("index.js", "")]),
        ("b", serde_json::json!({"name": "b"}), &[("index.js", "require('a');")]),
    ]);

    let output = run(&["batch", "a", "b", "--root", path_str(project.path())]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["a"].as_object().unwrap().len(), 1);
    let b = json["b"].as_object().unwrap();
    assert!(b.contains_key("/node_modules/b/index.js"));
    assert!(b.contains_key("/node_modules/a/index.js"));
}

#[test]
fn test_extract_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("entry.js");
    std::fs::write(
        &file,
        "import x from \"x\";\n// require('commented')\nconst y = require('./y');\n",
    )
    .unwrap();

    let output = run(&["--json", "extract", path_str(&file)]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let requires = json["requires"].as_array().unwrap();
    assert_eq!(requires.len(), 2);
    assert_eq!(requires[0]["specifier"], "x");
    assert_eq!(requires[0]["kind"], "esm_import");
    assert_eq!(requires[1]["specifier"], "./y");
    assert_eq!(requires[1]["line"], 3);
}

#[test]
fn test_extract_failure_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.js");
    std::fs::write(&file, "var s = `never closed").unwrap();

    let output = run(&["--json", "extract", path_str(&file)]);
    assert!(!output.status.success());
    assert_eq!(stdout_json(&output)["error"]["code"], "EXTRACT_FAILED");
}

#[test]
fn test_resolve_json() {
    let project = create_project(&[(
        "dep",
        serde_json::json!({"name": "dep", "main": "lib/main.js"}),
        &[("lib/main.js", "")],
    )]);
    let from = project.path().join("index.js");
    std::fs::write(&from, "").unwrap();

    let output = run(&["--json", "resolve", "dep", "--from", path_str(&from)]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert!(json["resolved"]
        .as_str()
        .unwrap()
        .ends_with("main.js"));

    let output = run(&["--json", "resolve", "./nope", "--from", path_str(&from)]);
    assert!(!output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert!(!json["tried"].as_array().unwrap().is_empty());
}

#[test]
fn test_version_json() {
    let output = run(&["--json", "version"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["name"], "reqmap");
}
