//! The four pipeline stages.
//!
//! Each stage maps to one external tool invocation:
//!
//! ```text
//! guest crate ──► compile ──► guest.wasm ──► adapt ──► component.wasm ──┬──► introspect ──► WIT on stderr
//!                                 ▲                                      │
//!                  adapter shim ──┘                                      └──► publish ──► guest.wasm.br
//! ```
//!
//! Stages never retry, and each reports failure through its own [`Error`]
//! variant.
//!
//! [`Error`]: crate::error::Error

mod adapt;
mod compile;
mod introspect;
mod publish;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, ToolFailure};
use crate::invoke::{Invocation, Invoker, ToolOutput};

pub use adapt::{adapt, check_adapter};
pub use compile::compile;
pub use introspect::introspect;
pub use publish::{PublishedArtifact, publish};

/// Identifies a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compile,
    Adapt,
    Introspect,
    Publish,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Compile, Stage::Adapt, Stage::Introspect, Stage::Publish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Adapt => "adapt",
            Self::Introspect => "introspect",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Run a tool and turn anything but a zero exit into a [`ToolFailure`].
fn run_tool(invoker: &dyn Invoker, invocation: &Invocation) -> Result<ToolOutput, ToolFailure> {
    let command = invocation.command_line();
    match invoker.run(invocation) {
        Ok(output) if output.is_success() => Ok(output),
        Ok(output) => Err(ToolFailure {
            command,
            status: output.status,
            diagnostics: output.diagnostics().to_string(),
        }),
        Err(e) => Err(ToolFailure::message(
            command,
            None,
            format!("failed to run {}: {}", invocation.program.display(), e),
        )),
    }
}

/// Delete a previous artifact so only a fresh write satisfies
/// [`expect_artifact`].
fn remove_stale(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Confirm a tool actually wrote the artifact it claimed to.
///
/// Callers clear the path beforehand with [`remove_stale`] unless the tool
/// may legitimately leave an up-to-date artifact untouched, as cargo does.
fn expect_artifact(
    path: &Path,
    invocation: &Invocation,
    wrap: fn(ToolFailure) -> Error,
) -> Result<(), Error> {
    if path.is_file() {
        return Ok(());
    }
    Err(wrap(ToolFailure::message(
        invocation.command_line(),
        Some(0),
        format!("expected artifact was not produced: {}", path.display()),
    )))
}
