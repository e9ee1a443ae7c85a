//! Error types for levo-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::stage::Stage;

/// Result type for levo-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building and publishing a component.
///
/// Every stage has its own variant so the driver can hand a failure back
/// to the caller exactly as the stage reported it.
#[derive(Debug, Error)]
pub enum Error {
    /// The source compiler exited unsuccessfully or produced no module.
    #[error("compile failed: {0}")]
    Compile(ToolFailure),

    /// A required input artifact is absent or unusable.
    #[error("missing dependency {}: {reason}", path.display())]
    MissingDependency { path: PathBuf, reason: String },

    /// The component adaptation tool failed.
    #[error("adaptation failed: {0}")]
    Adaptation(ToolFailure),

    /// The component interface could not be read.
    #[error("introspection failed: {0}")]
    Introspection(ToolFailure),

    /// The compression encoder failed to publish the artifact.
    #[error("compression failed: {0}")]
    Compression(ToolFailure),

    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation not valid in the pipeline's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Details of an external tool run that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    /// Rendered command line.
    pub command: String,

    /// Exit code, `None` if the process never ran or was killed by a signal.
    pub status: Option<i32>,

    /// Captured diagnostic output (stderr, falling back to stdout).
    pub diagnostics: String,
}

impl ToolFailure {
    /// Failure with an explicit message rather than captured tool output.
    pub fn message(
        command: impl Into<String>,
        status: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            status,
            diagnostics: message.into(),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(0) => write!(f, "`{}` exited successfully", self.command)?,
            Some(code) => write!(f, "`{}` exited with status {}", self.command, code)?,
            None => write!(f, "`{}` did not complete", self.command)?,
        }
        let diagnostics = self.diagnostics.trim();
        if !diagnostics.is_empty() {
            write!(f, "\n{}", diagnostics)?;
        }
        Ok(())
    }
}

impl Error {
    /// The pipeline stage this error originated from, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Compile(_) => Some(Stage::Compile),
            Self::MissingDependency { .. } | Self::Adaptation(_) => Some(Stage::Adapt),
            Self::Introspection(_) => Some(Stage::Introspect),
            Self::Compression(_) => Some(Stage::Publish),
            Self::Config(_) | Self::InvalidState(_) | Self::Io(_) => None,
        }
    }

    /// Captured tool output, for stage errors that ran a tool.
    pub fn tool_failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Compile(failure)
            | Self::Adaptation(failure)
            | Self::Introspection(failure)
            | Self::Compression(failure) => Some(failure),
            _ => None,
        }
    }

    /// Render the error followed by a recovery hint for the operator.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n\nhint: {}", self, hint),
            None => self.to_string(),
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Compile(failure) => {
                if failure.status.is_none() {
                    Some("is cargo installed and on PATH?")
                } else if failure.diagnostics.contains("target may not be installed") {
                    Some("install the target with `rustup target add <triple>`")
                } else {
                    None
                }
            }
            Self::MissingDependency { .. } => Some(
                "download the WASI preview1 reactor adapter from the wasmtime release \
                 matching your runtime and place it at the configured adapter path",
            ),
            Self::Adaptation(failure) | Self::Introspection(failure)
                if failure.status.is_none() =>
            {
                Some("is wasm-tools installed? try `cargo install wasm-tools`")
            }
            Self::Adaptation(_) => {
                Some("check that the adapter version matches the module's WASI imports")
            }
            Self::Compression(failure) => {
                if failure.status.is_none() {
                    Some("is the brotli encoder installed and on PATH?")
                } else {
                    Some("the serving directory must exist and be writable; levo never creates it")
                }
            }
            Self::Config(_) => Some("run `levo config` to see the resolved configuration"),
            _ => None,
        }
    }
}
