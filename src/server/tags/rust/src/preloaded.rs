/* src/server/tags/rust/src/preloaded.rs */

use std::collections::HashMap;

use crate::attrs::Attributes;

/// URLs preloaded so far, with the attributes of their preload tag minus
/// `href`. Append-only until [`PreloadedAssets::clear`].
#[derive(Debug, Clone, Default)]
pub struct PreloadedAssets {
  entries: Vec<(String, Attributes)>,
  index: HashMap<String, usize>,
}

impl PreloadedAssets {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a preload; re-recording a URL replaces its attributes.
  pub fn record(&mut self, url: &str, mut attrs: Attributes) {
    attrs.remove("href");
    match self.index.get(url) {
      Some(&idx) => self.entries[idx].1 = attrs,
      None => {
        self.index.insert(url.to_string(), self.entries.len());
        self.entries.push((url.to_string(), attrs));
      }
    }
  }

  pub fn contains(&self, url: &str) -> bool {
    self.index.contains_key(url)
  }

  pub fn get(&self, url: &str) -> Option<&Attributes> {
    self.index.get(url).map(|&idx| &self.entries[idx].1)
  }

  /// Entries in the order they were first preloaded.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
    self.entries.iter().map(|(url, attrs)| (url.as_str(), attrs))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    self.index.clear();
  }
}
