//! End-to-end tests for the levo CLI.
//!
//! cargo, wasm-tools and brotli are replaced by shell scripts passed in
//! through a config file, so these tests need no real toolchain.

#![cfg(unix)]
#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const CARGO: &str = r#"#!/bin/sh
[ -f FAIL_COMPILE ] && { echo "error: could not compile \`guest\`" >&2; exit 101; }
mkdir -p target/wasm32-wasi/release
{ printf '\0asm\1\0\0\0'; cat src/lib.rs; } > target/wasm32-wasi/release/guest.wasm
"#;

const WASM_TOOLS: &str = r#"#!/bin/sh
if [ "$2" = new ]; then
  { printf '\0asm\15\0\1\0'; cat "$3" "$5"; } > "$7"
else
  printf 'package root:component;\n\nworld root {\n  export read-file: func(path: string) -> string;\n}\n'
fi
"#;

const BROTLI: &str = r#"#!/bin/sh
echo "$*" > "$(dirname "$0")/brotli.args"
while [ $# -gt 1 ]; do
  [ "$1" = -o ] && { out="$2"; shift; }
  shift
done
cp "$1" "$out"
"#;

/// Guest crate, serving directory, fake tools and a `levo.toml` tying them together.
struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();

        fs::create_dir_all(root.join("guest/src")).unwrap();
        fs::write(root.join("guest/src/lib.rs"), "pub fn read_file() {}\n").unwrap();
        fs::write(
            root.join("guest/wasi_snapshot_preview1.reactor.wasm"),
            b"\0asm\x01\0\0\0adapter",
        )
        .unwrap();
        fs::create_dir_all(root.join("server/static")).unwrap();

        let tools = root.join("tools");
        fs::create_dir_all(&tools).unwrap();
        write_script(&tools.join("cargo"), CARGO);
        write_script(&tools.join("wasm-tools"), WASM_TOOLS);
        write_script(&tools.join("brotli"), BROTLI);

        fs::write(
            root.join("levo.toml"),
            format!(
                "source_dir = \"guest\"\n\n[tools]\n\
                 cargo = \"{0}/cargo\"\n\
                 wasm_tools = \"{0}/wasm-tools\"\n\
                 brotli = \"{0}/brotli\"\n",
                tools.display()
            ),
        )
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn levo(&self) -> Command {
        let mut cmd = Command::cargo_bin("levo").expect("Failed to find levo binary");
        cmd.current_dir(&self.root);
        cmd
    }

    fn destination(&self) -> PathBuf {
        self.root.join("server/static/guest.wasm.br")
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

// =============================================================================
// levo build Tests
// =============================================================================

#[test]
fn test_zero_argument_run_publishes() {
    let project = TestProject::new();

    project
        .levo()
        .assert()
        .success()
        .stderr(predicate::str::contains("export read-file"))
        .stderr(predicate::str::contains("Published:"));

    assert!(project.destination().is_file());
}

#[test]
fn test_build_json_report() {
    let project = TestProject::new();

    let output = project
        .levo()
        .args(["build", "--json"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "levo build should succeed. stderr: {}", stderr);

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["interface"]["exports"][0]["name"], "read-file");
    assert_eq!(report["interface"]["exports"].as_array().unwrap().len(), 1);
    assert!(
        report["published"]["path"]
            .as_str()
            .unwrap()
            .ends_with("guest.wasm.br")
    );
}

#[test]
fn test_compile_failure_exits_nonzero_without_publishing() {
    let project = TestProject::new();
    fs::write(project.root.join("guest/FAIL_COMPILE"), "").unwrap();
    fs::write(project.destination(), b"old").unwrap();

    project
        .levo()
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("compile failed"))
        .stderr(predicate::str::contains("could not compile"));

    assert_eq!(fs::read(project.destination()).unwrap(), b"old");
    assert!(!project.root.join("tools/brotli.args").exists());
}

#[test]
fn test_missing_adapter_shows_hint() {
    let project = TestProject::new();
    fs::remove_file(project.root.join("guest/wasi_snapshot_preview1.reactor.wasm")).unwrap();

    project
        .levo()
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing dependency"))
        .stderr(predicate::str::contains("hint:"));

    assert!(!project.destination().exists());
}

#[test]
fn test_flags_override_config_file() {
    let project = TestProject::new();
    fs::create_dir_all(project.root.join("public")).unwrap();

    project
        .levo()
        .args(["build", "--dest", "public/app.wasm.br", "--quality", "5"])
        .assert()
        .success();

    assert!(project.root.join("public/app.wasm.br").is_file());
    assert!(!project.destination().exists());
    let args = fs::read_to_string(project.root.join("tools/brotli.args")).unwrap();
    assert!(args.starts_with("--force -q 5 -o "));
}

#[test]
fn test_required_export_missing() {
    let project = TestProject::new();

    project
        .levo()
        .args(["build", "--require-export", "setup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("introspection failed"))
        .stderr(predicate::str::contains("does not export setup"));
}

#[test]
fn test_invalid_quality_is_config_error() {
    let project = TestProject::new();

    project
        .levo()
        .args(["build", "--quality", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

// =============================================================================
// levo doctor / config Tests
// =============================================================================

#[test]
fn test_doctor_reports_missing_serving_directory() {
    let project = TestProject::new();
    fs::remove_dir_all(project.root.join("server")).unwrap();

    project
        .levo()
        .arg("doctor")
        .assert()
        .failure()
        .stderr(predicate::str::contains("serving directory"))
        .stderr(predicate::str::contains("check(s) failed"));
}

#[test]
fn test_config_prints_resolved_toml() {
    let project = TestProject::new();

    project
        .levo()
        .args(["config", "--target", "wasm32-wasip1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target_triple = \"wasm32-wasip1\""))
        .stdout(predicate::str::contains("source_dir = \"guest\""));
}

#[test]
fn test_unknown_config_key_fails() {
    let project = TestProject::new();
    fs::write(project.root.join("levo.toml"), "destination = \"x.br\"\n").unwrap();

    project
        .levo()
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("levo.toml"));
}
