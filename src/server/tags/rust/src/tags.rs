/* src/server/tags/rust/src/tags.rs */

//! Tag factory: composes default and resolved attributes for one asset and
//! renders the literal HTML tag.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::attrs::Attributes;
use crate::manifest::Chunk;
use crate::resolver::{ResolveInput, ResolverPipeline, TagKind};

/// Maps a build-relative path (`build/assets/app.js`) to a URL; the flag
/// requests a secure URL.
pub type AssetPathFn = Arc<dyn Fn(&str, bool) -> String + Send + Sync>;

fn style_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"\.(css|less|sass|scss|styl|stylus|pcss|postcss)(\?[^.]*)?$")
      .expect("style suffix pattern is valid")
  })
}

/// Stylesheet paths are recognized by extension, optionally followed by a
/// query string. Everything else is a script.
pub fn is_css_path(path: &str) -> bool {
  style_re().is_match(path)
}

/// `build_directory` joined with `file`, as fed to the asset path resolver.
/// Empty and `.` segments are dropped and `..` pops the previous segment,
/// so the result is a clean slash-separated path.
pub fn build_path(build_directory: &str, file: &str) -> String {
  let rooted = build_directory.starts_with('/');
  let mut segments: Vec<&str> = Vec::new();
  for segment in build_directory.split('/').chain(file.split('/')) {
    match segment {
      "" | "." => {}
      ".." => match segments.last() {
        Some(&last) if last != ".." => {
          segments.pop();
        }
        _ if rooted => {}
        _ => segments.push(".."),
      },
      _ => segments.push(segment),
    }
  }
  let joined = segments.join("/");
  if rooted { format!("/{joined}") } else { joined }
}

/// Default URL scheme: site-root relative.
pub fn default_asset_path(path: &str) -> String {
  format!("/{}", path.trim_start_matches('/'))
}

/// Per-render view over the engine settings needed to build tags.
pub struct TagFactory<'a> {
  pub build_directory: &'a str,
  pub nonce: Option<&'a str>,
  pub integrity_key: &'a str,
  pub resolvers: &'a ResolverPipeline,
  pub asset_path: Option<&'a AssetPathFn>,
}

impl TagFactory<'_> {
  /// URL of a build output file.
  pub fn url_for(&self, file: &str) -> String {
    let path = build_path(self.build_directory, file);
    match self.asset_path {
      Some(resolve) => resolve(&path, false),
      None => default_asset_path(&path),
    }
  }

  fn integrity(&self, chunk: Option<&Chunk>, attrs: &mut Attributes) {
    if let Some(value) = chunk.and_then(|c| c.integrity(self.integrity_key)) {
      attrs.set("integrity", value);
    }
  }

  pub fn script_attributes(&self, input: &ResolveInput<'_>) -> Attributes {
    let mut attrs =
      Attributes::new().with("type", "module").with("src", input.url).with("nonce", self.nonce);
    self.integrity(input.chunk, &mut attrs);
    self.resolvers.apply(TagKind::Script, attrs, input)
  }

  pub fn style_attributes(&self, input: &ResolveInput<'_>) -> Attributes {
    let mut attrs =
      Attributes::new().with("rel", "stylesheet").with("href", input.url).with("nonce", self.nonce);
    self.integrity(input.chunk, &mut attrs);
    self.resolvers.apply(TagKind::Style, attrs, input)
  }

  /// Preload attributes, or `None` when a preload resolver opted out.
  /// `crossorigin` follows whatever the matching script/style tag would get.
  pub fn preload_attributes(&self, input: &ResolveInput<'_>) -> Option<Attributes> {
    let (rel, kind, crossorigin) = if is_css_path(input.url) {
      ("preload", "style", self.style_attributes(input).remove("crossorigin"))
    } else {
      ("modulepreload", "script", self.script_attributes(input).remove("crossorigin"))
    };
    let mut attrs = Attributes::new()
      .with("rel", rel)
      .with("as", kind)
      .with("href", input.url)
      .with("nonce", self.nonce)
      .with("crossorigin", crossorigin);
    self.integrity(input.chunk, &mut attrs);
    self.resolvers.apply_preload(attrs, input)
  }

  /// `<script>` or `<link rel="stylesheet">` depending on the URL.
  pub fn render_tag(&self, input: &ResolveInput<'_>) -> String {
    if is_css_path(input.url) {
      stylesheet_tag(&self.style_attributes(input))
    } else {
      script_tag(&self.script_attributes(input))
    }
  }
}

pub fn script_tag(attrs: &Attributes) -> String {
  format!("<script {}></script>", attrs.render())
}

pub fn stylesheet_tag(attrs: &Attributes) -> String {
  format!("<link {} />", attrs.render())
}

pub fn preload_tag(attrs: &Attributes) -> String {
  format!("<link {} />", attrs.render())
}
