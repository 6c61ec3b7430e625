//! Integration tests for the command-line interface

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const UNANNOTATED: &str = "angular.module('app').controller('Main', function ($scope, $http) {});\n";
const ANNOTATED: &str =
    "angular.module('app').controller('Main', ['$scope', '$http', function ($scope, $http) {}]);\n";

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ts-ng-annotate"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.ts"), UNANNOTATED).unwrap();
    fs::write(dir.path().join("done.ts"), ANNOTATED).unwrap();
    dir
}

#[test]
fn test_annotate_help() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["annotate", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Annotate source files in place"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_annotate_rewrites_files() {
    let workspace = setup_workspace();

    let output = run(workspace.path(), &["annotate", "app.ts", "done.ts"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app.ts: Applied 2 edits"));
    assert!(stdout.contains("done.ts: Already annotated"));
    assert!(stdout.contains("Summary:"));

    assert_eq!(
        fs::read_to_string(workspace.path().join("app.ts")).unwrap(),
        ANNOTATED
    );
}

#[test]
fn test_annotate_is_idempotent() {
    let workspace = setup_workspace();

    run(workspace.path(), &["annotate", "app.ts"]);
    let output = run(workspace.path(), &["annotate", "app.ts"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app.ts: Already annotated"));
    assert_eq!(
        fs::read_to_string(workspace.path().join("app.ts")).unwrap(),
        ANNOTATED
    );
}

#[test]
fn test_annotate_dry_run_with_diff() {
    let workspace = setup_workspace();

    let output = run(workspace.path(), &["annotate", "--dry-run", "--diff", "app.ts"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("app.ts: Would apply 2 edits"));
    assert!(stdout.contains(&format!("+{ANNOTATED}")));
    assert!(stdout.contains(&format!("-{UNANNOTATED}")));

    assert_eq!(
        fs::read_to_string(workspace.path().join("app.ts")).unwrap(),
        UNANNOTATED
    );
}

#[test]
fn test_annotate_reports_broken_file() {
    let workspace = setup_workspace();
    fs::write(workspace.path().join("broken.ts"), "angular.module('app').run(function (a {});\n")
        .unwrap();

    let output = run(workspace.path(), &["annotate", "broken.ts", "app.ts"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.ts"));
    // the good file is still written
    assert_eq!(
        fs::read_to_string(workspace.path().join("app.ts")).unwrap(),
        ANNOTATED
    );
}

#[test]
fn test_config_file_is_picked_up() {
    let workspace = setup_workspace();
    fs::write(
        workspace.path().join("ng-annotate.toml"),
        "[recognizer]\nregistration_methods = [\"run\"]\n",
    )
    .unwrap();

    let output = run(workspace.path(), &["annotate", "app.ts"]);
    assert!(output.status.success());
    // controller is no longer a registration method
    assert_eq!(
        fs::read_to_string(workspace.path().join("app.ts")).unwrap(),
        UNANNOTATED
    );
}

#[test]
fn test_invalid_config_fails() {
    let workspace = setup_workspace();
    fs::write(workspace.path().join("bad.toml"), "[recognizer]\nmarker = \"\"\n").unwrap();

    let output = run(workspace.path(), &["--config", "bad.toml", "annotate", "app.ts"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("recognizer.marker"));
}

#[test]
fn test_fixture_command_passes_and_fails() {
    let workspace = TempDir::new().unwrap();
    let fixtures = workspace.path().join("tests/fixtures");
    fs::create_dir_all(&fixtures).unwrap();
    fs::write(fixtures.join("app.ts"), UNANNOTATED).unwrap();
    fs::write(fixtures.join("app.annotated.ts"), ANNOTATED).unwrap();

    let output = run(workspace.path(), &["test"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("All fixtures match"));

    fs::write(fixtures.join("app.annotated.ts"), UNANNOTATED).unwrap();
    let output = run(workspace.path(), &["test", "tests/fixtures"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MISMATCH"));
    assert!(stderr.contains("@@"));
    assert!(stderr.contains(&format!("+{ANNOTATED}")));
}
