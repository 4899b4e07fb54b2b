/* src/server/tags/rust/src/manifest.rs */

//! Vite `manifest.json`: typed chunks plus a per-path cache.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::attrs::AttrValue;
use crate::errors::{Result, ViteError};

/// One manifest entry. Only `file` is required; the other modelled fields
/// fall back to their defaults when they carry the wrong JSON type, and
/// non-string list items are dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
  pub file: String,
  #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
  pub src: Option<String>,
  #[serde(default, deserialize_with = "lenient_bool")]
  pub is_entry: bool,
  #[serde(default, deserialize_with = "lenient_strings")]
  pub imports: Vec<String>,
  #[serde(default, deserialize_with = "lenient_strings")]
  pub dynamic_imports: Vec<String>,
  #[serde(default, deserialize_with = "lenient_strings")]
  pub css: Vec<String>,
  /// Fields not modelled above (integrity hashes, `name`, `assets`, ...).
  #[serde(flatten)]
  pub extra: serde_json::Map<String, Value>,
}

fn lenient_string<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(d)? {
    Value::String(s) => Some(s),
    _ => None,
  })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
  Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
}

fn lenient_strings<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
  let Value::Array(items) = Value::deserialize(d)? else {
    return Ok(Vec::new());
  };
  Ok(
    items
      .into_iter()
      .filter_map(|item| match item {
        Value::String(s) => Some(s),
        _ => None,
      })
      .collect(),
  )
}

impl Chunk {
  /// Minimal chunk for a file that has no manifest entry of its own
  /// (CSS side-files).
  pub fn from_file(file: impl Into<String>) -> Self {
    Self { file: file.into(), ..Self::default() }
  }

  /// Integrity value stored under `key`; an empty key disables the lookup.
  pub fn integrity(&self, key: &str) -> Option<AttrValue> {
    if key.is_empty() {
      return None;
    }
    self.extra.get(key).map(AttrValue::from)
  }
}

/// Parsed manifest: chunk key -> chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
  chunks: BTreeMap<String, Chunk>,
}

impl Manifest {
  /// Parse manifest JSON. The document must be a JSON object; entries that
  /// do not deserialize as a chunk are dropped.
  pub fn parse(json: &str) -> std::result::Result<Self, serde_json::Error> {
    let raw: serde_json::Map<String, Value> = serde_json::from_str(json)?;
    Ok(Self::from_entries(raw))
  }

  fn from_entries(raw: serde_json::Map<String, Value>) -> Self {
    let chunks = raw
      .into_iter()
      .filter_map(|(key, value)| match serde_json::from_value::<Chunk>(value) {
        Ok(chunk) => Some((key, chunk)),
        Err(e) => {
          debug!(chunk = %key, error = %e, "skipping malformed manifest entry");
          None
        }
      })
      .collect();
    Self { chunks }
  }

  pub fn get(&self, key: &str) -> Option<&Chunk> {
    self.chunks.get(key)
  }

  /// Lookup for a primary request target: absence is an error.
  pub fn chunk(&self, key: &str) -> Result<&Chunk> {
    self.chunks.get(key).ok_or_else(|| ViteError::chunk_not_found(key))
  }

  /// First chunk (in key order) whose output `file` equals `file`.
  pub fn find_by_file(&self, file: &str) -> Option<(&str, &Chunk)> {
    self.chunks.iter().find(|(_, c)| c.file == file).map(|(k, c)| (k.as_str(), c))
  }

  pub fn len(&self) -> usize {
    self.chunks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Chunk)> {
    self.chunks.iter().map(|(k, c)| (k.as_str(), c))
  }
}

impl FromIterator<(String, Chunk)> for Manifest {
  fn from_iter<I: IntoIterator<Item = (String, Chunk)>>(iter: I) -> Self {
    Self { chunks: iter.into_iter().collect() }
  }
}

/// Loaded manifests keyed by resolved path. Entries are never refreshed
/// from disk; call [`ManifestStore::clear`] after a redeploy.
///
/// Not synchronized: share across threads only behind external locking.
#[derive(Debug, Default)]
pub struct ManifestStore {
  cache: HashMap<PathBuf, Arc<Manifest>>,
}

impl ManifestStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn load(&mut self, path: &Path) -> Result<Arc<Manifest>> {
    if let Some(cached) = self.cache.get(path) {
      trace!(path = %path.display(), "manifest cache hit");
      return Ok(Arc::clone(cached));
    }

    let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
      io::ErrorKind::NotFound => ViteError::ManifestNotFound { path: path.to_path_buf() },
      _ => ViteError::ManifestRead { path: path.to_path_buf(), source },
    })?;
    let manifest = Manifest::parse(&content)
      .map_err(|source| ViteError::ManifestParse { path: path.to_path_buf(), source })?;
    debug!(path = %path.display(), chunks = manifest.len(), "loaded vite manifest");

    let manifest = Arc::new(manifest);
    self.cache.insert(path.to_path_buf(), Arc::clone(&manifest));
    Ok(manifest)
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.cache.contains_key(path)
  }

  pub fn clear(&mut self) {
    self.cache.clear();
  }

  pub fn len(&self) -> usize {
    self.cache.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cache.is_empty()
  }
}
