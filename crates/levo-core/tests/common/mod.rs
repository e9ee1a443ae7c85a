//! Fake guest project and toolchain for end-to-end pipeline tests.
//!
//! The tools are small shell scripts that mimic cargo, wasm-tools and
//! brotli closely enough for the pipeline: they write the artifacts the
//! real tools would, fail the same way, and log every call to
//! `tools/calls.log`. The fake encoder copies its input unchanged, so a
//! published artifact "decompresses" to itself.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use levo_core::{PipelineConfig, ToolPaths};
use tempfile::TempDir;

const CARGO: &str = r#"#!/bin/sh
echo "cargo $*" >> "$(dirname "$0")/calls.log"
if [ -f FAIL_COMPILE ]; then
  echo 'error[E0425]: cannot find value `x` in this scope' >&2
  exit 101
fi
triple=""
profile=debug
dir="${CARGO_TARGET_DIR:-target}"
while [ $# -gt 0 ]; do
  case "$1" in
    --target) triple="$2"; shift ;;
    --release) profile=release ;;
    --profile) profile="$2"; shift ;;
    --target-dir) dir="$2"; shift ;;
  esac
  shift
done
out="$dir/$triple/$profile"
mkdir -p "$out"
{ printf '\0asm\1\0\0\0'; cat src/lib.rs; } > "$out/guest.wasm"
"#;

const WASM_TOOLS: &str = r#"#!/bin/sh
echo "wasm-tools $*" >> "$(dirname "$0")/calls.log"
case "$1 $2" in
  "component new")
    module="$3"
    shift 3
    while [ $# -gt 0 ]; do
      case "$1" in
        --adapt) adapter="$2"; shift ;;
        -o) out="$2"; shift ;;
      esac
      shift
    done
    { printf '\0asm\15\0\1\0'; cat "$module" "$adapter"; } > "$out"
    ;;
  "component wit")
    if grep -q BROKEN "$3"; then
      echo "error: failed to decode world from module" >&2
      exit 1
    fi
    cat <<'WIT'
package root:component;

world root {
  import wasi:io/streams@0.2.0;
  import wasi:filesystem/types@0.2.0;

  export read-file: func(path: string) -> result<list<u8>, string>;
}
WIT
    ;;
  *)
    echo "unsupported: $*" >&2
    exit 2
    ;;
esac
"#;

const BROTLI: &str = r#"#!/bin/sh
echo "brotli $*" >> "$(dirname "$0")/calls.log"
while [ $# -gt 1 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
  esac
  shift
done
cp "$1" "$out"
"#;

pub const GUEST_SOURCE: &str = r#"#[unsafe(no_mangle)]
pub extern "C" fn read_file() {}
"#;

/// A temporary tree with a guest crate, a serving directory and fake tools.
///
/// ```text
/// <tmp>/guest/            source_dir
/// <tmp>/server/static/    serving directory
/// <tmp>/tools/            cargo, wasm-tools, brotli, calls.log
/// ```
pub struct Project {
    _temp: TempDir,
    pub root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();

        let guest = root.join("guest");
        fs::create_dir_all(guest.join("src")).expect("Failed to create guest crate");
        fs::write(
            guest.join("Cargo.toml"),
            "[package]\nname = \"guest\"\nversion = \"0.1.0\"\n\n\
             [lib]\ncrate-type = [\"cdylib\"]\n",
        )
        .expect("Failed to write Cargo.toml");
        fs::write(guest.join("src/lib.rs"), GUEST_SOURCE).expect("Failed to write lib.rs");
        fs::write(
            guest.join("wasi_snapshot_preview1.reactor.wasm"),
            b"\0asm\x01\0\0\0reactor-adapter",
        )
        .expect("Failed to write adapter");

        fs::create_dir_all(root.join("server/static")).expect("Failed to create serving dir");

        let tools = root.join("tools");
        fs::create_dir_all(&tools).expect("Failed to create tools dir");
        write_script(&tools.join("cargo"), CARGO);
        write_script(&tools.join("wasm-tools"), WASM_TOOLS);
        write_script(&tools.join("brotli"), BROTLI);

        Self { _temp: temp, root }
    }

    pub fn guest_dir(&self) -> PathBuf {
        self.root.join("guest")
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }

    /// Default configuration pointed at the fake tools.
    pub fn config(&self) -> PipelineConfig {
        let tools = self.tools_dir();
        PipelineConfig {
            source_dir: self.guest_dir(),
            tools: ToolPaths {
                cargo: tools.join("cargo"),
                wasm_tools: tools.join("wasm-tools"),
                brotli: tools.join("brotli"),
            },
            ..Default::default()
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.root.join("server/static/guest.wasm.br")
    }

    /// Make the next compile fail.
    pub fn break_compile(&self) {
        fs::write(self.guest_dir().join("FAIL_COMPILE"), "").expect("Failed to write marker");
    }

    /// Make the next component fail introspection.
    pub fn break_component(&self) {
        fs::write(self.guest_dir().join("src/lib.rs"), "// BROKEN\n")
            .expect("Failed to write lib.rs");
    }

    /// `program subcommand` of every tool call so far.
    pub fn calls(&self) -> Vec<String> {
        let log = self.tools_dir().join("calls.log");
        let Ok(text) = fs::read_to_string(log) else {
            return Vec::new();
        };
        text.lines()
            .map(|line| {
                let words: Vec<&str> = line.split_whitespace().collect();
                let n = if words.first() == Some(&"wasm-tools") { 3 } else { 2 };
                words[..n.min(words.len())].join(" ")
            })
            .collect()
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("Failed to write script");
    let mut perms = fs::metadata(path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
}
