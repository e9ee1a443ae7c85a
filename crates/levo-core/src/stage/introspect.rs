//! Interface introspector.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::{Error, Result, ToolFailure};
use crate::interface::InterfaceDescription;
use crate::invoke::{Invocation, Invoker};

use super::run_tool;

/// Read the component's declared interface.
///
/// Read-only with respect to every artifact. Nothing is returned unless the
/// whole description parsed and all required exports are present.
///
/// # Errors
///
/// Returns [`Error::Introspection`] if the tool fails, its output contains
/// no world, or a configured required export is missing.
pub fn introspect(
    config: &PipelineConfig,
    component_path: &Path,
    invoker: &dyn Invoker,
) -> Result<InterfaceDescription> {
    let invocation = Invocation::new(&config.tools.wasm_tools)
        .args(["component", "wit"])
        .arg(component_path)
        .current_dir(&config.source_dir);

    let output = run_tool(invoker, &invocation).map_err(Error::Introspection)?;

    let description = InterfaceDescription::parse(&output.stdout).ok_or_else(|| {
        Error::Introspection(ToolFailure::message(
            invocation.command_line(),
            output.status,
            "tool output contains no world declaration",
        ))
    })?;

    let missing: Vec<&str> = config
        .required_exports
        .iter()
        .map(String::as_str)
        .filter(|name| !description.exports(name))
        .collect();

    if !missing.is_empty() {
        return Err(Error::Introspection(ToolFailure::message(
            invocation.command_line(),
            output.status,
            format!(
                "component does not export {} (exports: {})",
                missing.join(", "),
                description.export_names().join(", ")
            ),
        )));
    }

    tracing::info!(
        world = description.world.as_deref().unwrap_or_default(),
        imports = description.imports.len(),
        exports = description.exports.len(),
        "introspected component"
    );

    Ok(description)
}
