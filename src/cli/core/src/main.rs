/* src/cli/core/src/main.rs */

mod config;
mod ui;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vite_tags::{PrefetchStrategy, Vite, ViteConfig, ViteError};

use config::{find_config, load_config};

#[derive(Parser)]
#[command(name = "vite-tags", about = "Render Vite manifest entries as HTML tags", version)]
struct Cli {
  /// Path to vite-tags.toml (auto-detected if omitted)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,
  /// Log manifest loading and traversal to stderr
  #[arg(short, long, global = true)]
  verbose: bool,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print preload, script and stylesheet tags for entry points
  Render {
    /// Manifest keys to render (configured entry points if omitted)
    entries: Vec<String>,
    /// Build directory relative to the public dir
    #[arg(short, long)]
    build_dir: Option<String>,
    /// CSP nonce; pass the flag without a value to generate one
    #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
    nonce: Option<String>,
    /// Prefetch strategy for dynamic imports
    #[arg(short, long, value_enum)]
    prefetch: Option<PrefetchArg>,
  },
  /// Print the URL of one entry
  Asset {
    entry: String,
    #[arg(short, long)]
    build_dir: Option<String>,
  },
  /// Print the built contents of one entry
  Content {
    entry: String,
    #[arg(short, long)]
    build_dir: Option<String>,
  },
  /// Print the manifest hash (nothing in hot mode or without a manifest)
  Hash {
    #[arg(short, long)]
    build_dir: Option<String>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum PrefetchArg {
  None,
  Waterfall,
  Aggressive,
}

impl From<PrefetchArg> for PrefetchStrategy {
  fn from(arg: PrefetchArg) -> Self {
    match arg {
      PrefetchArg::None => Self::None,
      PrefetchArg::Waterfall => Self::Waterfall,
      PrefetchArg::Aggressive => Self::Aggressive,
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("vite_tags=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Explicit path, else the nearest vite-tags.toml above cwd, else defaults.
fn resolve_config(explicit: Option<PathBuf>) -> Result<ViteConfig> {
  let path = match explicit {
    Some(p) => Some(p),
    None => {
      let cwd = std::env::current_dir().context("failed to get cwd")?;
      find_config(&cwd)?
    }
  };
  match path {
    Some(path) => {
      debug!(path = %path.display(), "loading config");
      load_config(&path)
    }
    None => {
      debug!("no config file found, using defaults");
      Ok(ViteConfig::default())
    }
  }
}

/// Execute `cli`, writing command output to `out`.
fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
  let config = resolve_config(cli.config)?;
  let mut vite = Vite::from_config(config);

  match cli.command {
    Command::Render { entries, build_dir, nonce, prefetch } => {
      if let Some(nonce) = nonce {
        let nonce = vite.use_csp_nonce(Some(nonce.as_str()));
        ui::detail(&format!("nonce {nonce}"));
      }
      if let Some(strategy) = prefetch {
        vite.use_prefetch_strategy(strategy.into());
      }
      let entries = if entries.is_empty() { vite.entry_points().to_vec() } else { entries };
      if entries.is_empty() {
        ui::warn("no entry points given and none configured");
      }
      if vite.is_running_hot() {
        ui::arrow(&format!("dev server detected via {}", vite.hot_file_path().display()));
      }
      let html = vite.invoke(&entries, build_dir.as_deref())?;
      writeln!(out, "{html}")?;
    }
    Command::Asset { entry, build_dir } => {
      writeln!(out, "{}", vite.asset(&entry, build_dir.as_deref())?)?;
    }
    Command::Content { entry, build_dir } => {
      write!(out, "{}", vite.content(&entry, build_dir.as_deref())?)?;
    }
    Command::Hash { build_dir } => match vite.manifest_hash(build_dir.as_deref())? {
      Some(hash) => writeln!(out, "{hash}")?,
      None => ui::ok("no manifest hash (hot mode or manifest missing)"),
    },
  }
  Ok(())
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli, &mut std::io::stdout().lock()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      ui::fail(&format!("{e:#}"));
      if let Some(err) = e.downcast_ref::<ViteError>() {
        ui::detail(err.code());
      }
      ExitCode::FAILURE
    }
  }
}
