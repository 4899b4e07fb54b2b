/* src/server/tags/rust/src/config.rs */

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::prefetch::PrefetchStrategy;

/// Engine settings. Read-only while rendering; setters on
/// [`crate::Vite`] may change them between renders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ViteConfig {
  /// Web root on disk. The manifest and the hot file are resolved against
  /// it; rendered URLs are not.
  pub public_dir: PathBuf,
  pub build_directory: String,
  pub manifest_filename: String,
  pub hot_file: PathBuf,
  pub entry_points: Vec<String>,
  /// `Some("")` asks for a generated nonce.
  pub nonce: Option<String>,
  /// Manifest field copied into `integrity`; empty disables the lookup.
  pub integrity_key: String,
  pub prefetch: PrefetchStrategy,
  pub prefetch_concurrency: usize,
  pub prefetch_event: String,
}

impl Default for ViteConfig {
  fn default() -> Self {
    Self {
      public_dir: PathBuf::from("."),
      build_directory: default_build_directory(),
      manifest_filename: "manifest.json".to_string(),
      hot_file: PathBuf::from("hot"),
      entry_points: Vec::new(),
      nonce: None,
      integrity_key: "integrity".to_string(),
      prefetch: PrefetchStrategy::None,
      prefetch_concurrency: 3,
      prefetch_event: "load".to_string(),
    }
  }
}

fn default_build_directory() -> String {
  "build".to_string()
}

impl ViteConfig {
  /// `public_dir/build_directory/manifest_filename`.
  pub fn manifest_path(&self, build_directory: &str) -> PathBuf {
    self.public_dir.join(build_directory).join(&self.manifest_filename)
  }

  /// Sentinel location; an absolute `hot_file` ignores `public_dir`.
  pub fn hot_file_path(&self) -> PathBuf {
    self.public_dir.join(&self.hot_file)
  }

  /// On-disk location of a build output file.
  pub fn build_file_path(&self, build_directory: &str, file: &str) -> PathBuf {
    self.public_dir.join(build_directory).join(Path::new(file.trim_start_matches('/')))
  }
}
