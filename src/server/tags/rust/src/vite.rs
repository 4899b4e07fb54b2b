/* src/server/tags/rust/src/vite.rs */

//! Engine facade: configuration, resolver registration, and the render
//! entry points for dev-server and production modes.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::attrs::Attributes;
use crate::config::ViteConfig;
use crate::digest::{content_hash, generate_nonce};
use crate::errors::{Result, ViteError};
use crate::graph::{collect_dynamic, collect_static};
use crate::hot::{hot_asset, hot_origin, is_running_hot, join_url};
use crate::manifest::{Manifest, ManifestStore};
use crate::prefetch::{PrefetchOptions, PrefetchStrategy, render_prefetch_script};
use crate::preloaded::PreloadedAssets;
use crate::resolver::{ResolveInput, ResolverPipeline, SharedResolver, TagKind};
use crate::tags::{AssetPathFn, TagFactory};

const VITE_CLIENT: &str = "@vite/client";
const REACT_REFRESH: &str = "@react-refresh";

/// Stateful tag renderer. One instance per server is typical; every
/// mutating call takes `&mut self`, so concurrent renders need their own
/// instance or external locking.
pub struct Vite {
  config: ViteConfig,
  nonce: Option<String>,
  asset_path: Option<AssetPathFn>,
  resolvers: ResolverPipeline,
  preloaded: PreloadedAssets,
  manifests: ManifestStore,
}

impl Default for Vite {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Vite {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Vite")
      .field("config", &self.config)
      .field("nonce", &self.nonce)
      .field("custom_asset_path", &self.asset_path.is_some())
      .field("resolvers", &self.resolvers)
      .field("preloaded", &self.preloaded.len())
      .field("cached_manifests", &self.manifests.len())
      .finish()
  }
}

impl Vite {
  pub fn new() -> Self {
    Self::from_config(ViteConfig::default())
  }

  /// A configured `nonce` of `""` generates a fresh one.
  pub fn from_config(config: ViteConfig) -> Self {
    let nonce = match config.nonce.as_deref() {
      Some("") => Some(generate_nonce()),
      Some(n) => Some(n.to_string()),
      None => None,
    };
    Self {
      config,
      nonce,
      asset_path: None,
      resolvers: ResolverPipeline::new(),
      preloaded: PreloadedAssets::new(),
      manifests: ManifestStore::new(),
    }
  }

  pub fn config(&self) -> &ViteConfig {
    &self.config
  }

  // -- configuration --

  /// Set the CSP nonce, generating one when `nonce` is `None` or empty.
  /// Returns the nonce in effect.
  pub fn use_csp_nonce(&mut self, nonce: Option<&str>) -> String {
    let nonce = match nonce {
      Some(n) if !n.is_empty() => n.to_string(),
      _ => generate_nonce(),
    };
    self.nonce = Some(nonce.clone());
    nonce
  }

  pub fn csp_nonce(&self) -> Option<&str> {
    self.nonce.as_deref()
  }

  /// Manifest field copied into `integrity`; an empty key disables it.
  pub fn use_integrity_key(&mut self, key: impl Into<String>) -> &mut Self {
    self.config.integrity_key = key.into();
    self
  }

  pub fn with_entry_points<I, S>(&mut self, entry_points: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.config.entry_points = entry_points.into_iter().map(Into::into).collect();
    self
  }

  /// Append entry points, dropping duplicates; first occurrence keeps its place.
  pub fn merge_entry_points<I, S>(&mut self, entry_points: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let merged = std::mem::take(&mut self.config.entry_points)
      .into_iter()
      .chain(entry_points.into_iter().map(Into::into));
    let mut seen = HashSet::new();
    self.config.entry_points = merged.filter(|e| seen.insert(e.clone())).collect();
    self
  }

  pub fn entry_points(&self) -> &[String] {
    &self.config.entry_points
  }

  pub fn use_public_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
    self.config.public_dir = path.into();
    self
  }

  pub fn use_build_directory(&mut self, path: impl Into<String>) -> &mut Self {
    self.config.build_directory = path.into();
    self
  }

  pub fn use_manifest_filename(&mut self, filename: impl Into<String>) -> &mut Self {
    self.config.manifest_filename = filename.into();
    self
  }

  pub fn use_hot_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
    self.config.hot_file = path.into();
    self
  }

  pub fn hot_file_path(&self) -> PathBuf {
    self.config.hot_file_path()
  }

  /// Replace the default `"/" + path` URL scheme.
  pub fn create_asset_paths_using<F>(&mut self, resolver: F) -> &mut Self
  where
    F: Fn(&str, bool) -> String + Send + Sync + 'static,
  {
    self.asset_path = Some(Arc::new(resolver));
    self
  }

  pub fn use_script_tag_attributes<F>(&mut self, resolver: F) -> &mut Self
  where
    F: Fn(&ResolveInput<'_>) -> Option<Attributes> + Send + Sync + 'static,
  {
    self.use_resolver(TagKind::Script, Arc::new(resolver))
  }

  pub fn use_style_tag_attributes<F>(&mut self, resolver: F) -> &mut Self
  where
    F: Fn(&ResolveInput<'_>) -> Option<Attributes> + Send + Sync + 'static,
  {
    self.use_resolver(TagKind::Style, Arc::new(resolver))
  }

  /// Returning `None` from `resolver` suppresses the preload for that asset.
  pub fn use_preload_tag_attributes<F>(&mut self, resolver: F) -> &mut Self
  where
    F: Fn(&ResolveInput<'_>) -> Option<Attributes> + Send + Sync + 'static,
  {
    self.use_resolver(TagKind::Preload, Arc::new(resolver))
  }

  pub fn use_resolver(&mut self, kind: TagKind, resolver: SharedResolver) -> &mut Self {
    self.resolvers.push(kind, resolver);
    self
  }

  /// `None` concurrency selects aggressive prefetching, `Some(n)` a
  /// waterfall of width `n`. An empty `event` means `"load"`.
  pub fn prefetch(&mut self, concurrency: Option<usize>, event: &str) -> &mut Self {
    self.config.prefetch_event = if event.is_empty() { "load".to_string() } else { event.to_string() };
    match concurrency {
      Some(n) => self.use_waterfall_prefetching(Some(n)),
      None => self.use_aggressive_prefetching(),
    }
  }

  /// Keeps the current concurrency when `None`.
  pub fn use_waterfall_prefetching(&mut self, concurrency: Option<usize>) -> &mut Self {
    if let Some(n) = concurrency {
      self.config.prefetch_concurrency = n;
    }
    self.use_prefetch_strategy(PrefetchStrategy::Waterfall)
  }

  pub fn use_aggressive_prefetching(&mut self) -> &mut Self {
    self.use_prefetch_strategy(PrefetchStrategy::Aggressive)
  }

  pub fn use_prefetch_strategy(&mut self, strategy: PrefetchStrategy) -> &mut Self {
    self.config.prefetch = strategy;
    self
  }

  // -- rendering --

  /// Probes the sentinel file on every call.
  pub fn is_running_hot(&self) -> bool {
    is_running_hot(&self.hot_file_path())
  }

  /// Tags for `entries`. `build_directory` overrides the configured one.
  pub fn invoke<S: AsRef<str>>(
    &mut self,
    entries: &[S],
    build_directory: Option<&str>,
  ) -> Result<String> {
    if self.is_running_hot() {
      return self.hot_tags(entries);
    }
    let build_directory = self.build_directory(build_directory);
    let manifest = self.manifest(&build_directory)?;
    Ok(self.production_tags(entries, &build_directory, &manifest))
  }

  /// Tags for the configured entry points.
  pub fn to_html(&mut self) -> Result<String> {
    let entries = self.config.entry_points.clone();
    self.invoke(&entries, None)
  }

  fn build_directory(&self, build_directory: Option<&str>) -> String {
    build_directory.unwrap_or(&self.config.build_directory).to_string()
  }

  fn factory<'a>(&'a self, build_directory: &'a str) -> TagFactory<'a> {
    TagFactory {
      build_directory,
      nonce: self.nonce.as_deref(),
      integrity_key: &self.config.integrity_key,
      resolvers: &self.resolvers,
      asset_path: self.asset_path.as_ref(),
    }
  }

  fn hot_tags<S: AsRef<str>>(&self, entries: &[S]) -> Result<String> {
    let origin = hot_origin(&self.hot_file_path())?;
    let factory = self.factory("");
    let render = |src: &str| {
      let url = join_url(&origin, src);
      factory.render_tag(&ResolveInput { src, url: &url, chunk: None, manifest: None })
    };
    let mut html = render(VITE_CLIENT);
    for entry in entries {
      html.push_str(&render(entry.as_ref()));
    }
    Ok(html)
  }

  fn production_tags<S: AsRef<str>>(
    &mut self,
    entries: &[S],
    build_directory: &str,
    manifest: &Manifest,
  ) -> String {
    let mut preloaded = std::mem::take(&mut self.preloaded);
    let factory = self.factory(build_directory);
    let mut html = collect_static(&factory, manifest, entries, &mut preloaded).to_html();

    if self.config.prefetch != PrefetchStrategy::None {
      let assets = collect_dynamic(&factory, manifest, entries, &preloaded);
      debug!(count = assets.len(), strategy = ?self.config.prefetch, "collected prefetch assets");
      let opts = PrefetchOptions {
        strategy: self.config.prefetch,
        concurrency: self.config.prefetch_concurrency,
        event: &self.config.prefetch_event,
        nonce: factory.nonce,
      };
      html.push_str(&render_prefetch_script(&assets, &opts));
    }

    self.preloaded = preloaded;
    html
  }

  /// Parsed manifest for `build_directory`, cached after the first read.
  pub fn manifest(&mut self, build_directory: &str) -> Result<Arc<Manifest>> {
    let path = self.config.manifest_path(build_directory);
    self.manifests.load(&path)
  }

  /// URL of one entry: dev-server URL when hot, else the built file's URL.
  pub fn asset(&mut self, name: &str, build_directory: Option<&str>) -> Result<String> {
    if self.is_running_hot() {
      return hot_asset(&self.hot_file_path(), name);
    }
    let build_directory = self.build_directory(build_directory);
    let manifest = self.manifest(&build_directory)?;
    let chunk = manifest.chunk(name)?;
    Ok(self.factory(&build_directory).url_for(&chunk.file))
  }

  /// Contents of the built file behind `name`.
  pub fn content(&mut self, name: &str, build_directory: Option<&str>) -> Result<String> {
    let build_directory = self.build_directory(build_directory);
    let manifest = self.manifest(&build_directory)?;
    let chunk = manifest.chunk(name)?;
    let path = self.config.build_file_path(&build_directory, &chunk.file);
    std::fs::read_to_string(&path).map_err(|source| ViteError::AssetRead { path, source })
  }

  /// Digest of the manifest file, for cache busting. `None` in hot mode or
  /// when no manifest exists.
  pub fn manifest_hash(&self, build_directory: Option<&str>) -> Result<Option<String>> {
    if self.is_running_hot() {
      return Ok(None);
    }
    let path = self.config.manifest_path(&self.build_directory(build_directory));
    hash_file(&path)
  }

  /// React Fast Refresh preamble; `None` outside hot mode.
  pub fn react_refresh(&self) -> Result<Option<String>> {
    if !self.is_running_hot() {
      return Ok(None);
    }
    let runtime = hot_asset(&self.hot_file_path(), REACT_REFRESH)?;
    let attrs = Attributes::new().with("nonce", self.nonce.as_deref());
    Ok(Some(format!(
      r#"<script type="module" {}>
    import RefreshRuntime from '{runtime}'
    RefreshRuntime.injectIntoGlobalHook(window)
    window.$RefreshReg$ = () => {{}}
    window.$RefreshSig$ = () => (type) => type
    window.__vite_plugin_react_preamble_installed__ = true
</script>"#,
      attrs.render()
    )))
  }

  /// URLs preloaded since the last [`Vite::flush`].
  pub fn preloaded_assets(&self) -> &PreloadedAssets {
    &self.preloaded
  }

  pub fn flush(&mut self) {
    self.preloaded.clear();
  }

  /// Forget every cached manifest; the next render re-reads from disk.
  pub fn clear_manifest_cache(&mut self) {
    self.manifests.clear();
  }
}

fn hash_file(path: &Path) -> Result<Option<String>> {
  match std::fs::read(path) {
    Ok(bytes) => Ok(Some(content_hash(&bytes))),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(ViteError::Io { path: path.to_path_buf(), source }),
  }
}
