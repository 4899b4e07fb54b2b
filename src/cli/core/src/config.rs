/* src/cli/core/src/config.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use vite_tags::ViteConfig;

pub const CONFIG_FILENAME: &str = "vite-tags.toml";

/// Walk upward from `start` looking for `vite-tags.toml`.
pub fn find_config(start: &Path) -> Result<Option<PathBuf>> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join(CONFIG_FILENAME);
    if candidate.is_file() {
      return Ok(Some(candidate));
    }
    if !dir.pop() {
      return Ok(None);
    }
  }
}

/// Parse and validate a config file. A relative `public_dir` is taken
/// relative to the file's directory.
pub fn load_config(path: &Path) -> Result<ViteConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let mut config: ViteConfig =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  if let Some(base) = path.parent().filter(|_| config.public_dir.is_relative()) {
    config.public_dir = base.join(&config.public_dir);
  }
  validate(&config).with_context(|| format!("invalid config {}", path.display()))?;
  Ok(config)
}

pub fn validate(config: &ViteConfig) -> Result<()> {
  if config.prefetch_concurrency == 0 {
    bail!("prefetch_concurrency must be at least 1");
  }
  if config.manifest_filename.is_empty() {
    bail!("manifest_filename must not be empty");
  }
  Ok(())
}
