/* src/server/tags/rust/src/prefetch.rs */

//! Client-side loader that prefetches dynamic-import assets after a page
//! event fires.

use serde::{Deserialize, Serialize};

/// How prefetch hints are delivered. `None` emits no loader at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefetchStrategy {
  #[default]
  None,
  /// A fixed number of requests in flight; each settled request starts the next.
  Waterfall,
  /// Every link appended at once.
  Aggressive,
}

/// One asset handed to the loader; serialized as link attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefetchAsset {
  pub rel: String,
  #[serde(rename = "fetchpriority")]
  pub fetch_priority: String,
  pub href: String,
  #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
  pub as_: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nonce: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub crossorigin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub integrity: Option<String>,
}

impl PrefetchAsset {
  pub fn new(href: impl Into<String>) -> Self {
    Self {
      rel: "prefetch".to_string(),
      fetch_priority: "low".to_string(),
      href: href.into(),
      as_: None,
      nonce: None,
      crossorigin: None,
      integrity: None,
    }
  }
}

/// Loader settings taken from the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct PrefetchOptions<'a> {
  pub strategy: PrefetchStrategy,
  pub concurrency: usize,
  pub event: &'a str,
  pub nonce: Option<&'a str>,
}

const MAKE_LINK: &str = r"const makeLink = (asset) => {
            const link = document.createElement('link')

            Object.keys(asset).forEach((attribute) => {
                link.setAttribute(attribute, asset[attribute])
            })

            return link
        }";

const WATERFALL: &str = r"
<script%NONCE%>
     window.addEventListener('%EVENT%', () => window.setTimeout(() => {
        %MAKE_LINK%

        const loadNext = (assets, count) => window.setTimeout(() => {
            if (count > assets.length) {
                count = assets.length

                if (count === 0) {
                    return
                }
            }

            const fragment = new DocumentFragment

            while (count > 0) {
                const link = makeLink(assets.shift())
                fragment.append(link)
                count--

                if (assets.length) {
                    link.onload = () => loadNext(assets, 1)
                    link.onerror = () => loadNext(assets, 1)
                }
            }

            document.head.append(fragment)
        })

        loadNext(%ASSETS%, %CONCURRENCY%)
    }))
</script>";

const AGGRESSIVE: &str = r"
<script%NONCE%>
     window.addEventListener('%EVENT%', () => window.setTimeout(() => {
        %MAKE_LINK%

        const fragment = new DocumentFragment;
        %ASSETS%.forEach((asset) => fragment.append(makeLink(asset)))
        document.head.append(fragment)
     }))
</script>";

/// `<`, `>` and `&` only occur inside JSON strings, where the `\u` forms
/// decode to the same text but cannot close the surrounding `<script>`.
fn escape_script_json(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  for ch in json.chars() {
    match ch {
      '<' => out.push_str("\\u003c"),
      '>' => out.push_str("\\u003e"),
      '&' => out.push_str("\\u0026"),
      _ => out.push(ch),
    }
  }
  out
}

/// Render the loader script. Empty when there is nothing to prefetch or
/// the strategy is `None`.
pub fn render_prefetch_script(assets: &[PrefetchAsset], opts: &PrefetchOptions<'_>) -> String {
  if assets.is_empty() {
    return String::new();
  }
  let template = match opts.strategy {
    PrefetchStrategy::None => return String::new(),
    PrefetchStrategy::Waterfall => WATERFALL,
    PrefetchStrategy::Aggressive => AGGRESSIVE,
  };
  let Ok(assets_json) = serde_json::to_string(assets) else {
    return String::new();
  };
  let assets_json = escape_script_json(&assets_json);
  let nonce_attr = opts.nonce.map(|n| format!(r#" nonce="{n}""#)).unwrap_or_default();

  // Asset JSON goes in last so its content is never rescanned.
  template
    .replace("%MAKE_LINK%", MAKE_LINK)
    .replace("%NONCE%", &nonce_attr)
    .replace("%EVENT%", opts.event)
    .replace("%CONCURRENCY%", &opts.concurrency.max(1).to_string())
    .replace("%ASSETS%", &assets_json)
}
