//! Toolchain checks.
//!
//! Verifies that the tools and adapter a pipeline run needs are present,
//! without running any stage.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::invoke::{Invocation, Invoker};
use crate::stage::check_adapter;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

/// Outcome of all checks, in the order they ran.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolchainReport {
    pub items: Vec<CheckItem>,
}

impl ToolchainReport {
    /// Returns true if every check passed.
    pub fn is_ok(&self) -> bool {
        self.items.iter().all(|i| i.ok)
    }

    /// Checks that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &CheckItem> {
        self.items.iter().filter(|i| !i.ok)
    }

    fn push(&mut self, name: impl Into<String>, ok: bool, detail: impl Into<String>) {
        self.items.push(CheckItem {
            name: name.into(),
            ok,
            detail: detail.into(),
        });
    }
}

impl fmt::Display for ToolchainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            let mark = if item.ok { "ok" } else { "FAIL" };
            writeln!(f, "{:<5} {:<24} {}", mark, item.name, item.detail)?;
        }
        Ok(())
    }
}

/// Checks the environment for a given configuration.
pub struct ToolchainCheck<'a> {
    config: &'a PipelineConfig,
    invoker: &'a dyn Invoker,
}

impl<'a> ToolchainCheck<'a> {
    pub fn new(config: &'a PipelineConfig, invoker: &'a dyn Invoker) -> Self {
        Self { config, invoker }
    }

    /// Run every check.
    pub fn run(&self) -> ToolchainReport {
        let mut report = ToolchainReport::default();

        let tools = &self.config.tools;
        let cargo = self.check_tool(&mut report, "cargo", &tools.cargo);
        self.check_tool(&mut report, "wasm-tools", &tools.wasm_tools);
        self.check_tool(&mut report, "brotli", &tools.brotli);

        if cargo.is_some() {
            self.check_target(&mut report);
        }

        let adapter = self.config.adapter_path();
        match check_adapter(&adapter) {
            Ok(()) => report.push("adapter", true, adapter.display().to_string()),
            Err(e) => report.push("adapter", false, e.to_string()),
        }

        let destination = self.config.destination_path();
        match destination.parent() {
            Some(dir) if dir.is_dir() => {
                report.push("serving directory", true, dir.display().to_string())
            }
            Some(dir) => report.push(
                "serving directory",
                false,
                format!("{} does not exist", dir.display()),
            ),
            None => report.push("serving directory", false, "destination has no parent directory"),
        }

        report
    }

    fn check_tool(
        &self,
        report: &mut ToolchainReport,
        name: &str,
        program: &Path,
    ) -> Option<PathBuf> {
        match locate(program, &self.config.source_dir) {
            Some(path) => {
                report.push(name, true, path.display().to_string());
                Some(path)
            }
            None => {
                report.push(name, false, format!("{} not found", program.display()));
                None
            }
        }
    }

    /// Ask rustup whether the compilation target is installed.
    ///
    /// Skipped when rustup is absent (e.g. a distro-packaged toolchain).
    fn check_target(&self, report: &mut ToolchainReport) {
        let name = format!("target {}", self.config.target_triple);
        let Ok(rustup) = which::which("rustup") else {
            report.push(name, true, "rustup not found, skipped");
            return;
        };

        let invocation = Invocation::new(rustup).args(["target", "list", "--installed"]);
        match self.invoker.run(&invocation) {
            Ok(output) if output.is_success() => {
                let installed = output
                    .stdout
                    .lines()
                    .any(|line| line.trim() == self.config.target_triple);
                if installed {
                    report.push(name, true, "installed");
                } else {
                    report.push(
                        name,
                        false,
                        format!(
                            "not installed; run `rustup target add {}`",
                            self.config.target_triple
                        ),
                    );
                }
            }
            Ok(output) => report.push(name, false, output.diagnostics().trim().to_string()),
            Err(e) => report.push(name, false, e.to_string()),
        }
    }
}

/// Find a program: paths with a directory component are resolved against
/// `base`, bare names are looked up on `PATH`.
fn locate(program: &Path, base: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        let path = if program.is_absolute() {
            program.to_path_buf()
        } else {
            base.join(program)
        };
        return path.is_file().then_some(path);
    }
    which::which(program).ok()
}
