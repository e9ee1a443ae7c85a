//! Shared configuration flags.

use std::path::{Path, PathBuf};

use clap::Args;
use levo_core::PipelineConfig;

/// Config file picked up from the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "levo.toml";

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Configuration file (default: ./levo.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Guest crate directory
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Compilation target triple
    #[arg(short, long, value_name = "TRIPLE")]
    pub target: Option<String>,

    /// Cargo profile
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Directory for the intermediate component artifact
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// WASI preview1 adapter
    #[arg(long, value_name = "FILE")]
    pub adapter: Option<PathBuf>,

    /// Published artifact path inside the serving directory
    #[arg(short, long, value_name = "FILE")]
    pub dest: Option<PathBuf>,

    /// Brotli quality (0-11)
    #[arg(short, long, value_name = "N")]
    pub quality: Option<u8>,

    /// Fail unless the component exports NAME (repeatable)
    #[arg(long = "require-export", value_name = "NAME")]
    pub require_exports: Vec<String>,
}

impl ConfigArgs {
    /// Build the pipeline configuration: defaults, then the config file,
    /// then flags. Paths given as flags are relative to the current directory.
    pub fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                tracing::debug!("loading {}", DEFAULT_CONFIG_FILE);
                PipelineConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => PipelineConfig::default(),
        };

        if let Some(source) = &self.source {
            config.source_dir = source.clone();
        }
        if let Some(target) = &self.target {
            config.target_triple = target.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = profile.clone();
        }
        if let Some(dir) = &self.out_dir {
            config.component_path = std::path::absolute(dir)?.join("component.wasm");
        }
        if let Some(adapter) = &self.adapter {
            config.adapter_path = std::path::absolute(adapter)?;
        }
        if let Some(dest) = &self.dest {
            config.destination_path = std::path::absolute(dest)?;
        }
        if self.quality.is_some() {
            config.compression_quality = self.quality;
        }
        config
            .required_exports
            .extend(self.require_exports.iter().cloned());

        Ok(config)
    }
}
