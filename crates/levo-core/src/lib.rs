//! Build-and-publish pipeline for levo guest components.
//!
//! This crate provides:
//! - Pipeline configuration with the guest crate's default layout
//! - An [`Invoker`] seam over external tools (cargo, wasm-tools, brotli)
//! - The compile, adapt, introspect and publish stages
//! - A fail-fast driver that runs them in order
//! - Toolchain checks for diagnosing a broken environment

pub mod config;
pub mod error;
pub mod interface;
pub mod invoke;
pub mod pipeline;
pub mod stage;
pub mod toolchain;

pub use config::{PipelineConfig, ToolPaths};
pub use error::{Error, Result, ToolFailure};
pub use interface::{InterfaceDescription, ItemKind, WorldItem};
pub use invoke::{Invocation, Invoker, ProcessInvoker, ToolOutput};
pub use pipeline::{BuildReport, Pipeline, PipelineObserver, PipelineState, StageTiming};
pub use stage::{PublishedArtifact, Stage};
pub use toolchain::{CheckItem, ToolchainCheck, ToolchainReport};
