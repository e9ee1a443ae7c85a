//! Pipeline configuration.
//!
//! All paths the pipeline reads or writes are listed here and injected into
//! the driver. The defaults reproduce the guest crate layout:
//!
//! ```text
//! guest/                                   source_dir
//! ├── Cargo.toml
//! ├── wasi_snapshot_preview1.reactor.wasm  adapter_path
//! └── target/
//!     ├── wasm32-wasi/release/guest.wasm   binary module
//!     └── component.wasm                   component_path
//! server/static/guest.wasm.br              destination_path
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest quality level accepted by the brotli encoder.
pub const MAX_COMPRESSION_QUALITY: u8 = 11;

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Guest crate directory; also the working directory for every tool.
    pub source_dir: PathBuf,

    /// Cargo package name of the guest crate.
    pub package: String,

    /// Compilation target triple.
    pub target_triple: String,

    /// Cargo profile (`release`, `dev`, or a custom profile).
    pub profile: String,

    /// Cargo target directory. Defaults to `<source_dir>/target`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,

    /// WASI preview1 adapter shim.
    pub adapter_path: PathBuf,

    /// Intermediate component artifact.
    pub component_path: PathBuf,

    /// Published compressed artifact inside the serving directory.
    pub destination_path: PathBuf,

    /// Encoder quality (0-11). Uses the encoder default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_quality: Option<u8>,

    /// Exports the component must declare for introspection to pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_exports: Vec<String>,

    /// External tool locations.
    pub tools: ToolPaths,
}

/// Program names or paths of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub cargo: PathBuf,
    pub wasm_tools: PathBuf,
    pub brotli: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            cargo: PathBuf::from("cargo"),
            wasm_tools: PathBuf::from("wasm-tools"),
            brotli: PathBuf::from("brotli"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            package: "guest".to_string(),
            target_triple: "wasm32-wasi".to_string(),
            profile: "release".to_string(),
            target_dir: None,
            adapter_path: PathBuf::from("wasi_snapshot_preview1.reactor.wasm"),
            component_path: PathBuf::from("target/component.wasm"),
            destination_path: PathBuf::from("../server/static/guest.wasm.br"),
            compression_quality: None,
            required_exports: Vec::new(),
            tools: ToolPaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check the configuration for values no tool could act on.
    pub fn validate(&self) -> Result<()> {
        if self.package.trim().is_empty() {
            return Err(Error::Config("package name is empty".to_string()));
        }
        if self.target_triple.trim().is_empty() {
            return Err(Error::Config("target triple is empty".to_string()));
        }
        if self.profile.trim().is_empty() {
            return Err(Error::Config("profile is empty".to_string()));
        }
        if let Some(quality) = self.compression_quality {
            if quality > MAX_COMPRESSION_QUALITY {
                return Err(Error::Config(format!(
                    "compression quality {} is out of range (0-{})",
                    quality, MAX_COMPRESSION_QUALITY
                )));
            }
        }
        if self.destination_path.file_name().is_none() {
            return Err(Error::Config(format!(
                "destination {} has no file name",
                self.destination_path.display()
            )));
        }
        if self.component_path.file_name().is_none() {
            return Err(Error::Config(format!(
                "component path {} has no file name",
                self.component_path.display()
            )));
        }
        Ok(())
    }

    /// Resolve a path relative to the source directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source_dir.join(path)
        }
    }

    /// Cargo target directory.
    ///
    /// Always passed to cargo explicitly, so `CARGO_TARGET_DIR`,
    /// `build.target-dir` and enclosing workspaces do not move the module.
    pub fn target_dir(&self) -> PathBuf {
        match &self.target_dir {
            Some(dir) => self.resolve(dir),
            None => self.source_dir.join("target"),
        }
    }

    /// Directory cargo uses for the configured profile.
    ///
    /// `dev` and `test` land in `debug`, `release` and `bench` in
    /// `release`. Custom profiles use their own name.
    pub fn profile_dir(&self) -> &str {
        match self.profile.as_str() {
            "dev" | "test" => "debug",
            "release" | "bench" => "release",
            other => other,
        }
    }

    /// File name of the compiled module (`-` becomes `_`, as cargo does).
    pub fn module_file_name(&self) -> String {
        format!("{}.wasm", self.package.replace('-', "_"))
    }

    /// Path of the binary module artifact produced by the compile stage.
    pub fn module_path(&self) -> PathBuf {
        self.target_dir()
            .join(&self.target_triple)
            .join(self.profile_dir())
            .join(self.module_file_name())
    }

    /// Resolved adapter artifact path.
    pub fn adapter_path(&self) -> PathBuf {
        self.resolve(&self.adapter_path)
    }

    /// Resolved component artifact path.
    pub fn component_path(&self) -> PathBuf {
        self.resolve(&self.component_path)
    }

    /// Resolved published artifact path.
    pub fn destination_path(&self) -> PathBuf {
        self.resolve(&self.destination_path)
    }
}
