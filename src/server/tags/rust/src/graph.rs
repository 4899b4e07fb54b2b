/* src/server/tags/rust/src/graph.rs */

//! Manifest traversal: the static closure that becomes preload and content
//! tags, and the dynamic closure that becomes prefetch hints.
//!
//! The static walk only preloads the *direct* imports of each entry, while
//! the dynamic walk recurses through `imports`, `dynamicImports` and `css`
//! of everything it reaches. Keys missing from the manifest are skipped.

use std::collections::HashSet;

use tracing::debug;

use crate::manifest::{Chunk, Manifest};
use crate::prefetch::PrefetchAsset;
use crate::preloaded::PreloadedAssets;
use crate::resolver::ResolveInput;
use crate::tags::{TagFactory, preload_tag};

/// Output of the static walk. Preloads render ahead of content tags so the
/// browser can start fetching before anything executes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTags {
  pub preloads: Vec<String>,
  pub tags: Vec<String>,
}

impl StaticTags {
  pub fn to_html(&self) -> String {
    let mut html = self.preloads.concat();
    html.push_str(&self.tags.concat());
    html
  }
}

struct StaticWalk<'a, 'f> {
  factory: &'a TagFactory<'f>,
  manifest: &'a Manifest,
  preloaded: &'a mut PreloadedAssets,
  processed: HashSet<String>,
  out: StaticTags,
}

fn input<'i>(
  manifest: &'i Manifest,
  src: &'i str,
  url: &'i str,
  chunk: &'i Chunk,
) -> ResolveInput<'i> {
  ResolveInput { src, url, chunk: Some(chunk), manifest: Some(manifest) }
}

impl StaticWalk<'_, '_> {
  fn preload(&mut self, src: &str, url: &str, chunk: &Chunk) {
    if !self.processed.insert(url.to_string()) {
      return;
    }
    match self.factory.preload_attributes(&input(self.manifest, src, url, chunk)) {
      Some(attrs) => {
        self.out.preloads.push(preload_tag(&attrs));
        self.preloaded.record(url, attrs);
      }
      None => debug!(%url, "preload suppressed by resolver"),
    }
  }

  fn css(&mut self, files: &[String]) {
    let manifest = self.manifest;
    for file in files {
      let fallback;
      let chunk = match manifest.find_by_file(file) {
        Some((_, c)) => c,
        None => {
          fallback = Chunk::from_file(file.as_str());
          &fallback
        }
      };
      let url = self.factory.url_for(file);
      self.preload(file, &url, chunk);
      let tag = self.factory.render_tag(&input(manifest, file, &url, chunk));
      self.out.tags.push(tag);
    }
  }

  fn entry(&mut self, key: &str) {
    let manifest = self.manifest;
    let Some(chunk) = manifest.get(key) else {
      debug!(entry = %key, "entry point missing from manifest, skipping");
      return;
    };
    let url = self.factory.url_for(&chunk.file);
    self.preload(key, &url, chunk);

    for import in &chunk.imports {
      let Some(imported) = manifest.get(import) else {
        debug!(%import, "import missing from manifest, skipping");
        continue;
      };
      let import_url = self.factory.url_for(&imported.file);
      self.preload(import, &import_url, imported);
      self.css(&imported.css);
    }

    let tag = self.factory.render_tag(&input(manifest, key, &url, chunk));
    self.out.tags.push(tag);
    self.css(&chunk.css);
  }
}

/// Preload and content tags for `entries`, in caller order. Preloads are
/// de-duplicated by URL across the whole call and recorded in `preloaded`.
pub fn collect_static<S: AsRef<str>>(
  factory: &TagFactory<'_>,
  manifest: &Manifest,
  entries: &[S],
  preloaded: &mut PreloadedAssets,
) -> StaticTags {
  let mut walk = StaticWalk {
    factory,
    manifest,
    preloaded,
    processed: HashSet::new(),
    out: StaticTags::default(),
  };
  for entry in entries {
    walk.entry(entry.as_ref());
  }
  walk.out
}

struct DynamicWalk<'a, 'f> {
  factory: &'a TagFactory<'f>,
  manifest: &'a Manifest,
  preloaded: &'a PreloadedAssets,
  seen: HashSet<&'a str>,
  assets: Vec<PrefetchAsset>,
}

impl<'a> DynamicWalk<'a, '_> {
  fn asset(&mut self, src: &str, file: &str, chunk: &Chunk) {
    let url = self.factory.url_for(file);
    if self.preloaded.contains(&url) {
      return;
    }
    let Some(attrs) = self.factory.preload_attributes(&input(self.manifest, src, &url, chunk)) else {
      debug!(%url, "prefetch suppressed by resolver");
      return;
    };
    let mut asset = PrefetchAsset::new(url.as_str());
    asset.as_ = attrs.text("as").map(str::to_string);
    asset.nonce = self.factory.nonce.map(str::to_string);
    asset.crossorigin = attrs.text("crossorigin").map(str::to_string);
    asset.integrity = attrs.text("integrity").map(str::to_string);
    self.assets.push(asset);
  }

  fn follow(&mut self, keys: &'a [String]) {
    let manifest = self.manifest;
    for key in keys {
      if !self.seen.insert(key.as_str()) {
        continue;
      }
      match manifest.get(key) {
        Some(chunk) => self.visit(key, chunk),
        None => debug!(import = %key, "dynamic dependency missing from manifest, skipping"),
      }
    }
  }

  fn visit(&mut self, key: &'a str, chunk: &'a Chunk) {
    let src = chunk.src.as_deref().unwrap_or(key);
    self.asset(src, &chunk.file, chunk);
    self.follow(&chunk.imports);
    self.follow(&chunk.dynamic_imports);

    let manifest = self.manifest;
    for file in &chunk.css {
      match manifest.find_by_file(file) {
        Some((_, css_chunk)) => self.asset(file, file, css_chunk),
        None => self.asset(file, file, &Chunk::from_file(file.as_str())),
      }
    }
  }
}

/// Prefetch hints for everything reachable through the dynamic imports of
/// `entries`. URLs already in `preloaded` are left out; the result is
/// de-duplicated by `href`, first occurrence wins.
pub fn collect_dynamic<S: AsRef<str>>(
  factory: &TagFactory<'_>,
  manifest: &Manifest,
  entries: &[S],
  preloaded: &PreloadedAssets,
) -> Vec<PrefetchAsset> {
  let mut walk =
    DynamicWalk { factory, manifest, preloaded, seen: HashSet::new(), assets: Vec::new() };

  for entry in entries {
    let Some(chunk) = manifest.get(entry.as_ref()) else {
      continue;
    };
    for key in &chunk.dynamic_imports {
      let Some(target) = manifest.get(key) else {
        continue;
      };
      // Only script and stylesheet roots seed the walk.
      if !(target.file.ends_with(".js") || target.file.ends_with(".css")) {
        continue;
      }
      if walk.seen.insert(key.as_str()) {
        walk.visit(key, target);
      }
    }
  }

  let mut hrefs = HashSet::new();
  walk.assets.retain(|asset| hrefs.insert(asset.href.clone()));
  walk.assets
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::attrs::Attributes;
  use crate::resolver::{ResolverPipeline, SharedResolver, TagKind};
  use serde_json::json;
  use std::sync::Arc;

  fn manifest(value: serde_json::Value) -> Manifest {
    Manifest::parse(&value.to_string()).unwrap()
  }

  fn factory(resolvers: &ResolverPipeline) -> TagFactory<'_> {
    TagFactory {
      build_directory: "build",
      nonce: None,
      integrity_key: "integrity",
      resolvers,
      asset_path: None,
    }
  }

  fn hrefs(assets: &[PrefetchAsset]) -> Vec<&str> {
    assets.iter().map(|a| a.href.as_str()).collect()
  }

  #[test]
  fn static_order_preloads_then_tags() {
    let m = manifest(json!({
      "main.js": {
        "file": "assets/main-abc.js",
        "css": ["assets/main-abc.css"],
        "imports": ["vendor.js"]
      },
      "vendor.js": { "file": "assets/vendor.js" }
    }));
    let resolvers = ResolverPipeline::new();
    let mut preloaded = PreloadedAssets::new();
    let out = collect_static(&factory(&resolvers), &m, &["main.js"], &mut preloaded);

    assert_eq!(
      out.preloads,
      vec![
        r#"<link rel="modulepreload" as="script" href="/build/assets/main-abc.js" />"#,
        r#"<link rel="modulepreload" as="script" href="/build/assets/vendor.js" />"#,
        r#"<link rel="preload" as="style" href="/build/assets/main-abc.css" />"#,
      ]
    );
    assert_eq!(
      out.tags,
      vec![
        r#"<script type="module" src="/build/assets/main-abc.js"></script>"#,
        r#"<link rel="stylesheet" href="/build/assets/main-abc.css" />"#,
      ]
    );
    assert_eq!(preloaded.len(), 3);
    let html = out.to_html();
    let main_preload = html.find("modulepreload\" as=\"script\" href=\"/build/assets/main-abc.js").unwrap();
    let script = html.find("<script").unwrap();
    assert!(main_preload < script);
  }

  #[test]
  fn static_walk_only_preloads_direct_imports() {
    let m = manifest(json!({
      "main.js": { "file": "assets/main.js", "imports": ["a.js"] },
      "a.js": { "file": "assets/a.js", "imports": ["b.js"], "css": ["assets/a.css"] },
      "b.js": { "file": "assets/b.js" }
    }));
    let resolvers = ResolverPipeline::new();
    let mut preloaded = PreloadedAssets::new();
    let html = collect_static(&factory(&resolvers), &m, &["main.js"], &mut preloaded).to_html();
    assert!(html.contains("/build/assets/a.js"));
    assert!(html.contains(r#"<link rel="stylesheet" href="/build/assets/a.css" />"#));
    assert!(!html.contains("/build/assets/b.js"));
  }

  #[test]
  fn static_preloads_are_unique_across_entries() {
    let m = manifest(json!({
      "a.js": { "file": "assets/a.js", "imports": ["shared.js"] },
      "b.js": { "file": "assets/b.js", "imports": ["shared.js", "a.js"] },
      "shared.js": { "file": "assets/shared.js" }
    }));
    let resolvers = ResolverPipeline::new();
    let mut preloaded = PreloadedAssets::new();
    let out = collect_static(&factory(&resolvers), &m, &["a.js", "b.js"], &mut preloaded);
    let mut urls: Vec<&String> = out.preloads.iter().collect();
    let total = urls.len();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), total);
    assert_eq!(total, 3);
    assert_eq!(out.tags.len(), 2);
  }

  #[test]
  fn static_skips_missing_keys() {
    let m = manifest(json!({
      "main.js": { "file": "assets/main.js", "imports": ["gone.js"] }
    }));
    let resolvers = ResolverPipeline::new();
    let mut preloaded = PreloadedAssets::new();
    let out = collect_static(&factory(&resolvers), &m, &["missing.js", "main.js"], &mut preloaded);
    assert_eq!(out.preloads.len(), 1);
    assert_eq!(out.tags.len(), 1);
  }

  #[test]
  fn suppressed_preload_keeps_content_tag() {
    let m = manifest(json!({
      "main.js": { "file": "assets/main.js", "css": ["assets/main.css"] }
    }));
    let mut resolvers = ResolverPipeline::new();
    let skip_css: SharedResolver = Arc::new(|input: &ResolveInput<'_>| {
      if input.url.ends_with(".css") { None } else { Some(Attributes::new()) }
    });
    resolvers.push(TagKind::Preload, skip_css);
    let mut preloaded = PreloadedAssets::new();
    let out = collect_static(&factory(&resolvers), &m, &["main.js"], &mut preloaded);
    assert_eq!(out.preloads.len(), 1);
    assert!(out.tags.iter().any(|t| t.contains(r#"rel="stylesheet" href="/build/assets/main.css""#)));
    assert!(!preloaded.contains("/build/assets/main.css"));
  }

  fn dynamic_manifest() -> Manifest {
    manifest(json!({
      "app.js": {
        "file": "assets/app.js",
        "imports": ["vendor.js"],
        "dynamicImports": ["lazy.js", "modal.js", "image.js"]
      },
      "vendor.js": { "file": "assets/vendor.js" },
      "lazy.js": {
        "file": "assets/lazy.js",
        "imports": ["shared.js", "vendor.js"],
        "css": ["assets/lazy.css"]
      },
      "modal.js": { "file": "assets/modal.js", "dynamicImports": ["tooltip.js"] },
      "shared.js": { "file": "assets/shared.js" },
      "tooltip.js": { "file": "assets/tooltip.js", "css": ["assets/lazy.css"] },
      "image.js": { "file": "assets/logo.svg" }
    }))
  }

  #[test]
  fn dynamic_walk_recurses_in_discovery_order() {
    let m = dynamic_manifest();
    let resolvers = ResolverPipeline::new();
    let preloaded = PreloadedAssets::new();
    let assets = collect_dynamic(&factory(&resolvers), &m, &["app.js"], &preloaded);
    assert_eq!(
      hrefs(&assets),
      vec![
        "/build/assets/lazy.js",
        "/build/assets/shared.js",
        "/build/assets/vendor.js",
        "/build/assets/lazy.css",
        "/build/assets/modal.js",
        "/build/assets/tooltip.js",
      ]
    );
    assert_eq!(assets[0].as_.as_deref(), Some("script"));
    assert_eq!(assets[3].as_.as_deref(), Some("style"));
    assert!(assets.iter().all(|a| a.rel == "prefetch" && a.fetch_priority == "low"));
  }

  #[test]
  fn dynamic_walk_skips_preloaded_urls() {
    let m = dynamic_manifest();
    let resolvers = ResolverPipeline::new();
    let f = factory(&resolvers);
    let mut preloaded = PreloadedAssets::new();

    let first = collect_dynamic(&f, &m, &["app.js"], &preloaded);
    let again = collect_dynamic(&f, &m, &["app.js"], &preloaded);
    assert_eq!(first, again);

    preloaded.record("/build/assets/vendor.js", Attributes::new());
    let after = collect_dynamic(&f, &m, &["app.js"], &preloaded);
    assert_eq!(after.len(), first.len() - 1);
    assert!(!hrefs(&after).contains(&"/build/assets/vendor.js"));
  }

  #[test]
  fn dynamic_cycle_terminates() {
    let m = manifest(json!({
      "a.js": { "file": "assets/a.js", "dynamicImports": ["b.js"] },
      "b.js": { "file": "assets/b.js", "dynamicImports": ["a.js"], "imports": ["b.js"] }
    }));
    let resolvers = ResolverPipeline::new();
    let preloaded = PreloadedAssets::new();
    let assets = collect_dynamic(&factory(&resolvers), &m, &["a.js"], &preloaded);
    assert_eq!(hrefs(&assets), vec!["/build/assets/b.js", "/build/assets/a.js"]);
  }

  #[test]
  fn dynamic_suppression_and_integrity() {
    let m = manifest(json!({
      "app.js": { "file": "assets/app.js", "dynamicImports": ["a.js", "b.js"] },
      "a.js": { "file": "assets/a.js", "integrity": "sha384-a" },
      "b.js": { "file": "assets/b.js" }
    }));
    let mut resolvers = ResolverPipeline::new();
    let skip_b: SharedResolver = Arc::new(|input: &ResolveInput<'_>| {
      if input.src == "b.js" { None } else { Some(Attributes::new()) }
    });
    resolvers.push(TagKind::Preload, skip_b);
    let preloaded = PreloadedAssets::new();
    let assets = collect_dynamic(&factory(&resolvers), &m, &["app.js"], &preloaded);
    assert_eq!(hrefs(&assets), vec!["/build/assets/a.js"]);
    assert_eq!(assets[0].integrity.as_deref(), Some("sha384-a"));
  }
}
