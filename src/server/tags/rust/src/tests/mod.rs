/* src/server/tags/rust/src/tests/mod.rs */

// End-to-end scenarios against a build directory on disk.

mod prefetch;

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::Vite;

pub(super) const ORIGIN: &str = "http://localhost:5173";

/// Temp web root with `build/manifest.json` and an engine pointed at it.
pub(super) struct Site {
  pub dir: TempDir,
  pub vite: Vite,
}

impl Site {
  pub fn new(manifest: &Value) -> Self {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), manifest);
    let mut vite = Vite::new();
    vite.use_public_dir(dir.path());
    Self { dir, vite }
  }

  pub fn start_dev_server(&self) {
    std::fs::write(self.dir.path().join("hot"), format!("{ORIGIN}\n")).unwrap();
  }

  pub fn stop_dev_server(&self) {
    std::fs::remove_file(self.dir.path().join("hot")).unwrap();
  }

  pub fn write_build_file(&self, file: &str, content: &str) {
    let path = self.dir.path().join("build").join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  pub fn render(&mut self, entries: &[&str]) -> String {
    self.vite.invoke(entries, None).unwrap()
  }
}

pub(super) fn write_manifest(root: &Path, manifest: &Value) {
  let build = root.join("build");
  std::fs::create_dir_all(&build).unwrap();
  std::fs::write(build.join("manifest.json"), manifest.to_string()).unwrap();
}

pub(super) fn app_manifest() -> Value {
  json!({
    "main.js": {
      "file": "assets/main-abc.js",
      "src": "main.js",
      "isEntry": true,
      "css": ["assets/main-abc.css"],
      "imports": ["vendor.js"]
    },
    "vendor.js": { "file": "assets/vendor-def.js" }
  })
}

pub(super) fn lazy_manifest() -> Value {
  json!({
    "app.js": {
      "file": "assets/app.js",
      "isEntry": true,
      "imports": ["vendor.js"],
      "dynamicImports": ["lazy.js"]
    },
    "vendor.js": { "file": "assets/vendor.js" },
    "lazy.js": {
      "file": "assets/lazy.js",
      "imports": ["vendor.js"],
      "css": ["assets/lazy.css"]
    }
  })
}
