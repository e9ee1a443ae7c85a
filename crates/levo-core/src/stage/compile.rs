//! Compiler invoker.

use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::invoke::{Invocation, Invoker};

use super::{expect_artifact, run_tool};

/// Build the guest crate for the configured target and profile.
///
/// Returns the path of the binary module artifact. Any previous module at
/// that path is overwritten by cargo.
///
/// # Errors
///
/// Returns [`Error::Compile`] if cargo cannot be started, exits non-zero,
/// or exits zero without producing the expected module.
pub fn compile(config: &PipelineConfig, invoker: &dyn Invoker) -> Result<PathBuf> {
    let module_path = config.module_path();
    let invocation = compile_invocation(config);

    tracing::info!(
        target_triple = %config.target_triple,
        profile = %config.profile,
        "compiling {}",
        config.package
    );

    run_tool(invoker, &invocation).map_err(Error::Compile)?;
    expect_artifact(&module_path, &invocation, Error::Compile)?;

    tracing::info!(module = %module_path.display(), "compiled binary module");
    Ok(module_path)
}

fn compile_invocation(config: &PipelineConfig) -> Invocation {
    let invocation = Invocation::new(&config.tools.cargo)
        .arg("build")
        .args(["--target", config.target_triple.as_str()]);

    let invocation = match config.profile.as_str() {
        "release" => invocation.arg("--release"),
        // cargo's default profile needs no flag
        "dev" => invocation,
        other => invocation.args(["--profile", other]),
    };

    // cargo config and CARGO_TARGET_DIR must not move the module
    invocation
        .arg("--target-dir")
        .arg(config.target_dir())
        .arg("--message-format=short")
        .current_dir(&config.source_dir)
}
