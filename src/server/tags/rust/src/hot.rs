/* src/server/tags/rust/src/hot.rs */

//! Dev-server detection through the `hot` sentinel file.
//! Every call re-probes the filesystem; the mode may flip while a server runs.

use std::fs;
use std::path::Path;

use crate::errors::{Result, ViteError};

/// True when the sentinel exists as a readable file.
pub fn is_running_hot(hot_file: &Path) -> bool {
  fs::File::open(hot_file).and_then(|f| f.metadata()).map(|m| m.is_file()).unwrap_or(false)
}

/// Dev-server base URL, the trimmed sentinel content.
pub fn hot_origin(hot_file: &Path) -> Result<String> {
  let content = fs::read_to_string(hot_file)
    .map_err(|source| ViteError::SentinelRead { path: hot_file.to_path_buf(), source })?;
  Ok(content.trim().to_string())
}

/// URL of `asset` on the dev server.
pub fn hot_asset(hot_file: &Path, asset: &str) -> Result<String> {
  Ok(join_url(&hot_origin(hot_file)?, asset))
}

/// Join with exactly one `/` between origin and path.
pub fn join_url(origin: &str, path: &str) -> String {
  format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_url_normalizes_slashes() {
    assert_eq!(join_url("http://localhost:5173", "main.js"), "http://localhost:5173/main.js");
    assert_eq!(join_url("http://localhost:5173/", "/main.js"), "http://localhost:5173/main.js");
    assert_eq!(
      join_url("http://localhost:5173", "@vite/client"),
      "http://localhost:5173/@vite/client"
    );
  }

  #[test]
  fn sentinel_presence_toggles_hot_mode() {
    let dir = tempfile::tempdir().unwrap();
    let hot = dir.path().join("hot");
    assert!(!is_running_hot(&hot));

    std::fs::write(&hot, "http://localhost:5173\n").unwrap();
    assert!(is_running_hot(&hot));
    assert_eq!(hot_origin(&hot).unwrap(), "http://localhost:5173");
    assert_eq!(hot_asset(&hot, "resources/app.js").unwrap(), "http://localhost:5173/resources/app.js");

    std::fs::remove_file(&hot).unwrap();
    assert!(!is_running_hot(&hot));
  }

  #[test]
  fn directory_is_not_a_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!is_running_hot(dir.path()));
  }

  #[test]
  fn missing_sentinel_reports_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = hot_origin(&dir.path().join("hot")).unwrap_err();
    assert!(matches!(err, ViteError::SentinelRead { .. }));
  }
}
