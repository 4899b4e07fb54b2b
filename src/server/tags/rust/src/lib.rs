/* src/server/tags/rust/src/lib.rs */

pub mod attrs;
pub mod config;
pub mod digest;
pub mod errors;
pub mod graph;
pub mod hot;
pub mod manifest;
pub mod prefetch;
pub mod preloaded;
pub mod resolver;
pub mod tags;
pub mod vite;

// Public API re-exports
pub use attrs::{AttrValue, Attributes};
pub use config::ViteConfig;
pub use errors::{Result, ViteError};
pub use manifest::{Chunk, Manifest, ManifestStore};
pub use prefetch::{PrefetchAsset, PrefetchStrategy};
pub use preloaded::PreloadedAssets;
pub use resolver::{AttributeResolver, ResolveInput, SharedResolver, TagKind};
pub use tags::{AssetPathFn, is_css_path};
pub use vite::Vite;

#[cfg(test)]
mod tests;
