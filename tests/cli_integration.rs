//! Command-line interface: apply and query.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SOURCE: &str = "const x: number = 10;\nconst y: string = 'y';\n";

/// A project with one TypeScript file and a plan that strips its annotations.
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/index.ts"), SOURCE).unwrap();
    fs::write(
        dir.path().join("plan.toml"),
        r#"[meta]
name = "strip-annotations"

[[edits]]
id = "zap-annotations"
glob = "src/**/*.ts"
query = "//type_annotation"

[edits.action]
type = "zap"
"#,
    )
    .unwrap();
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .unwrap()
}

fn apply(project: &Path, extra: &[&str]) -> Output {
    let plan = project.join("plan.toml");
    let mut args = vec![
        "apply",
        "--plan",
        plan.to_str().unwrap(),
        "--root",
        project.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    run(&args)
}

#[test]
fn apply_help() {
    let output = run(&["apply", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Run a TOML edit plan"));
}

#[test]
fn apply_rewrites_files() {
    let project = setup_project();
    let output = apply(project.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Plan: strip-annotations"));
    assert!(stdout.contains("zap-annotations"));
    assert!(stdout.contains("Summary:"));

    assert_eq!(
        fs::read_to_string(project.path().join("src/index.ts")).unwrap(),
        "const x = 10;\nconst y = 'y';\n"
    );
}

#[test]
fn dry_run_writes_nothing() {
    let project = setup_project();
    let output = apply(project.path(), &["--dry-run", "--diff"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("--- src/index.ts"));
    assert!(stdout.contains("+const x = 10;"));
    assert!(stdout.contains("would change"));

    assert_eq!(
        fs::read_to_string(project.path().join("src/index.ts")).unwrap(),
        SOURCE
    );
}

#[test]
fn invalid_plan_fails() {
    let project = setup_project();
    fs::write(project.path().join("plan.toml"), "[[edits]]\nid = \"broken\"\n").unwrap();

    let output = apply(project.path(), &[]);
    assert!(!output.status.success());
    assert_eq!(
        fs::read_to_string(project.path().join("src/index.ts")).unwrap(),
        SOURCE
    );
}

#[test]
fn query_prints_matches() {
    let project = setup_project();
    let output = run(&[
        "query",
        "//type_annotation",
        "--glob",
        "src/*.ts",
        "--root",
        project.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("src/index.ts:7"));
    assert!(stdout.contains("type_annotation"));
    assert!(stdout.contains("\": number\""));
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn query_with_pattern_engine() {
    let project = setup_project();
    let output = run(&[
        "query",
        "10",
        "--pattern",
        "--glob",
        "src/*.ts",
        "--lang",
        "typescript",
        "--root",
        project.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("src/index.ts:18"));
    assert!(stdout.contains("number"));
}
