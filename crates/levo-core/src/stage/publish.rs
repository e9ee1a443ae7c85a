//! Compressor/publisher.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::invoke::{Invocation, Invoker};

use super::{expect_artifact, remove_stale, run_tool};

/// The compressed component placed in the serving directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedArtifact {
    pub path: PathBuf,

    /// Size of the compressed file.
    pub compressed_bytes: u64,

    /// Size of the component it was made from.
    pub component_bytes: u64,
}

impl PublishedArtifact {
    /// Compressed size as a fraction of the component size.
    pub fn ratio(&self) -> f64 {
        if self.component_bytes == 0 {
            return 0.0;
        }
        self.compressed_bytes as f64 / self.component_bytes as f64
    }
}

/// Compress the component and move it into the destination path.
///
/// The encoder writes a sibling staging file which is then renamed over
/// the destination, so the serving directory never holds a partial or stale
/// artifact reported as fresh. The destination directory belongs to the
/// serving system and is never created here; if it is missing the encoder
/// fails and that failure is returned.
///
/// # Errors
///
/// Returns [`Error::Compression`] if the encoder fails or reports success
/// without writing its output, and [`Error::Io`] if the staged file cannot
/// be moved into place.
pub fn publish(
    config: &PipelineConfig,
    component_path: &Path,
    invoker: &dyn Invoker,
) -> Result<PublishedArtifact> {
    let destination = config.destination_path();
    let staging = staging_path(&destination);

    let mut invocation = Invocation::new(&config.tools.brotli).arg("--force");
    if let Some(quality) = config.compression_quality {
        invocation = invocation.arg("-q").arg(quality.to_string());
    }
    let invocation = invocation
        .arg("-o")
        .arg(&staging)
        .arg(component_path)
        .current_dir(&config.source_dir);

    remove_stale(&staging)?;

    tracing::info!(destination = %destination.display(), "publishing compressed component");

    let encoded = run_tool(invoker, &invocation)
        .map_err(Error::Compression)
        .and_then(|_| expect_artifact(&staging, &invocation, Error::Compression));
    if let Err(err) = encoded {
        // a half-written staging file is never served; dropping it is best effort
        fs::remove_file(&staging).ok();
        return Err(err);
    }
    fs::rename(&staging, &destination)?;

    let artifact = PublishedArtifact {
        compressed_bytes: fs::metadata(&destination)?.len(),
        component_bytes: fs::metadata(component_path)?.len(),
        path: destination,
    };

    tracing::info!(
        compressed_bytes = artifact.compressed_bytes,
        component_bytes = artifact.component_bytes,
        "published {}",
        artifact.path.display()
    );

    Ok(artifact)
}

/// `guest.wasm.br` stages as `guest.wasm.br.partial` in the same directory.
fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}
