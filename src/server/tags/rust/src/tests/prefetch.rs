/* src/server/tags/rust/src/tests/prefetch.rs */

use super::{Site, app_manifest, lazy_manifest};

const LAZY_ASSETS: &str = concat!(
  r#"[{"rel":"prefetch","fetchpriority":"low","href":"/build/assets/lazy.js","as":"script"},"#,
  r#"{"rel":"prefetch","fetchpriority":"low","href":"/build/assets/lazy.css","as":"style"}]"#,
);

#[test]
fn disabled_by_default() {
  let mut site = Site::new(&lazy_manifest());
  let html = site.render(&["app.js"]);
  assert!(!html.contains("addEventListener"));
}

#[test]
fn waterfall_skips_preloaded_assets() {
  let mut site = Site::new(&lazy_manifest());
  site.vite.use_waterfall_prefetching(Some(2));
  let html = site.render(&["app.js"]);

  let script_at = html.find("\n<script>").unwrap();
  assert!(html[..script_at].ends_with(r#"<script type="module" src="/build/assets/app.js"></script>"#));
  assert!(html.contains(&format!("loadNext({LAZY_ASSETS}, 2)")));
  assert!(!html.contains("fragment.append(makeLink(asset))"));
}

#[test]
fn aggressive_appends_all() {
  let mut site = Site::new(&lazy_manifest());
  site.vite.prefetch(None, "DOMContentLoaded");
  let html = site.render(&["app.js"]);
  assert!(html.contains("window.addEventListener('DOMContentLoaded'"));
  assert!(html.contains(&format!("{LAZY_ASSETS}.forEach((asset) => fragment.append(makeLink(asset)))")));
  assert!(!html.contains("loadNext"));
}

#[test]
fn nonce_reaches_loader_and_assets() {
  let mut site = Site::new(&lazy_manifest());
  site.vite.use_aggressive_prefetching();
  site.vite.use_csp_nonce(Some("xyz"));
  let html = site.render(&["app.js"]);
  assert!(html.contains(r#"<script nonce="xyz">"#));
  assert!(html.contains(r#""href":"/build/assets/lazy.js","as":"script","nonce":"xyz""#));
}

#[test]
fn nothing_to_prefetch_without_dynamic_imports() {
  let mut site = Site::new(&app_manifest());
  site.vite.use_waterfall_prefetching(None);
  assert!(!site.render(&["main.js"]).contains("addEventListener"));
}

#[test]
fn no_loader_in_hot_mode() {
  let mut site = Site::new(&lazy_manifest());
  site.vite.use_aggressive_prefetching();
  site.start_dev_server();
  assert!(!site.render(&["app.js"]).contains("addEventListener"));
}
