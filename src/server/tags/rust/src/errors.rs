/* src/server/tags/rust/src/errors.rs */

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the caller. Problems in incidental dependencies
/// (missing import keys, malformed entries) never reach this type; they are
/// skipped during traversal.
#[derive(Debug, Error)]
pub enum ViteError {
  #[error("vite manifest not found at: {}", path.display())]
  ManifestNotFound { path: PathBuf },
  #[error("failed to read vite manifest {}", path.display())]
  ManifestRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to parse vite manifest {}", path.display())]
  ManifestParse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("unable to locate file in vite manifest: {name}")]
  ChunkNotFound { name: String },
  #[error("failed to read hot file {}", path.display())]
  SentinelRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("unable to locate file from vite manifest: {}", path.display())]
  AssetRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to read {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl ViteError {
  pub fn chunk_not_found(name: impl Into<String>) -> Self {
    Self::ChunkNotFound { name: name.into() }
  }

  /// Stable machine-readable code, used by the CLI for exit diagnostics.
  pub fn code(&self) -> &'static str {
    match self {
      Self::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
      Self::ManifestRead { .. } => "MANIFEST_READ",
      Self::ManifestParse { .. } => "MANIFEST_PARSE",
      Self::ChunkNotFound { .. } => "CHUNK_NOT_FOUND",
      Self::SentinelRead { .. } => "SENTINEL_READ",
      Self::AssetRead { .. } => "ASSET_READ",
      Self::Io { .. } => "IO",
    }
  }
}

pub type Result<T> = std::result::Result<T, ViteError>;
