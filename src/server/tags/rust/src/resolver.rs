/* src/server/tags/rust/src/resolver.rs */

//! User-supplied attribute resolvers, one ordered list per tag kind.

use std::sync::Arc;

use crate::attrs::Attributes;
use crate::manifest::{Chunk, Manifest};

/// What a resolver sees for one asset. `chunk` and `manifest` are `None`
/// for dev-server tags.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
  pub src: &'a str,
  pub url: &'a str,
  pub chunk: Option<&'a Chunk>,
  pub manifest: Option<&'a Manifest>,
}

/// Contributes attributes to a tag. Returning `None` opts the asset out of
/// preloading; for script and style tags it contributes nothing.
pub trait AttributeResolver: Send + Sync {
  fn resolve(&self, input: &ResolveInput<'_>) -> Option<Attributes>;
}

impl<F> AttributeResolver for F
where
  F: Fn(&ResolveInput<'_>) -> Option<Attributes> + Send + Sync,
{
  fn resolve(&self, input: &ResolveInput<'_>) -> Option<Attributes> {
    self(input)
  }
}

pub type SharedResolver = Arc<dyn AttributeResolver>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
  Script,
  Style,
  Preload,
}

/// Registration-ordered resolvers. Later resolvers override earlier ones
/// on key conflicts.
#[derive(Clone, Default)]
pub struct ResolverPipeline {
  script: Vec<SharedResolver>,
  style: Vec<SharedResolver>,
  preload: Vec<SharedResolver>,
}

impl ResolverPipeline {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, kind: TagKind, resolver: SharedResolver) {
    self.list_mut(kind).push(resolver);
  }

  pub fn len(&self, kind: TagKind) -> usize {
    self.list(kind).len()
  }

  /// Apply every resolver of `kind` over `base`. Opt-outs are ignored.
  pub fn apply(&self, kind: TagKind, mut base: Attributes, input: &ResolveInput<'_>) -> Attributes {
    for resolver in self.list(kind) {
      if let Some(extra) = resolver.resolve(input) {
        base.merge(extra);
      }
    }
    base
  }

  /// Apply the preload resolvers; `None` as soon as one opts out.
  pub fn apply_preload(&self, mut base: Attributes, input: &ResolveInput<'_>) -> Option<Attributes> {
    for resolver in &self.preload {
      base.merge(resolver.resolve(input)?);
    }
    Some(base)
  }

  fn list(&self, kind: TagKind) -> &[SharedResolver] {
    match kind {
      TagKind::Script => &self.script,
      TagKind::Style => &self.style,
      TagKind::Preload => &self.preload,
    }
  }

  fn list_mut(&mut self, kind: TagKind) -> &mut Vec<SharedResolver> {
    match kind {
      TagKind::Script => &mut self.script,
      TagKind::Style => &mut self.style,
      TagKind::Preload => &mut self.preload,
    }
  }
}

impl std::fmt::Debug for ResolverPipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolverPipeline")
      .field("script", &self.script.len())
      .field("style", &self.style.len())
      .field("preload", &self.preload.len())
      .finish()
  }
}
