//! `trail` — inspect and edit a visit history store from the command line.
//!
//! Reads `trail.toml` (or the path given with `--config`), layers `TRAIL_*`
//! environment variables on top, opens the configured SQLite store and runs a
//! single subcommand against it.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trail_core::store::VisitStore;
use trail_store_sqlite::SqliteVisitStore;

use crate::{commands::Command, settings::Settings};

#[derive(Parser)]
#[command(author, version, about = "Trail visit history store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "trail.toml")]
  config: PathBuf,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so `--json` output stays machine-readable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let store_config = settings.store_config();

  match &store_config.path {
    Some(path) => {
      if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
      {
        std::fs::create_dir_all(dir)
          .with_context(|| format!("failed to create {}", dir.display()))?;
      }
    }
    None => tracing::warn!("in_memory is set; history will not be saved"),
  }

  let store = SqliteVisitStore::new(store_config).context("invalid store configuration")?;
  store
    .open()
    .await
    .with_context(|| format!("failed to open store {:?}", settings.name))?;

  let report = commands::run(&store, cli.command, &settings)
    .await
    .context("command failed")?;

  store.close().await.context("failed to close store")?;

  if cli.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print!("{report}");
  }

  Ok(())
}
