//! Component adapter.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{Error, Result, ToolFailure};
use crate::invoke::{Invocation, Invoker};

use super::{expect_artifact, remove_stale, run_tool};

/// Magic bytes every wasm binary (core module or component) starts with.
const WASM_MAGIC: [u8; 4] = *b"\0asm";

/// Wrap the binary module with the adapter shim into a component.
///
/// Any existing file at the component path is removed before the tool runs.
///
/// # Errors
///
/// Returns [`Error::MissingDependency`] if the module or adapter is absent
/// or not a wasm binary, and [`Error::Adaptation`] if the tool fails.
pub fn adapt(
    config: &PipelineConfig,
    module_path: &Path,
    invoker: &dyn Invoker,
) -> Result<PathBuf> {
    let adapter_path = config.adapter_path();
    let component_path = config.component_path();

    check_input(module_path)?;
    check_adapter(&adapter_path)?;

    let invocation = Invocation::new(&config.tools.wasm_tools)
        .args(["component", "new"])
        .arg(module_path)
        .arg("--adapt")
        .arg(&adapter_path)
        .arg("-o")
        .arg(&component_path)
        .current_dir(&config.source_dir);

    if let Some(parent) = component_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::Adaptation(ToolFailure::message(
                invocation.command_line(),
                None,
                format!("failed to create {}: {}", parent.display(), e),
            ))
        })?;
    }

    remove_stale(&component_path)?;

    tracing::info!(adapter = %adapter_path.display(), "adapting module to component");

    run_tool(invoker, &invocation).map_err(Error::Adaptation)?;
    expect_artifact(&component_path, &invocation, Error::Adaptation)?;

    tracing::info!(component = %component_path.display(), "created component");
    Ok(component_path)
}

/// Check that the adapter artifact exists and is a wasm binary.
///
/// The adapter is supplied by the environment, never built here, so a bad
/// adapter is reported as a missing dependency.
pub fn check_adapter(path: &Path) -> Result<()> {
    check_wasm_file(path, "adapter")
}

fn check_input(path: &Path) -> Result<()> {
    check_wasm_file(path, "binary module")
}

fn check_wasm_file(path: &Path, what: &str) -> Result<()> {
    let missing = |reason: String| Error::MissingDependency {
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(missing(format!("{} not found", what)));
    }
    if !path.is_file() {
        return Err(missing(format!("{} is not a file", what)));
    }

    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map_err(|e| missing(format!("{} is unreadable: {}", what, e)))?;

    if magic != WASM_MAGIC {
        return Err(missing(format!("{} is not a WebAssembly binary", what)));
    }
    Ok(())
}
