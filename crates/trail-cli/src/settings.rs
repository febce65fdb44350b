//! CLI configuration, read from `trail.toml` and `TRAIL_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use trail_core::config::{MigrationStrategy, StoreConfig};

fn default_name() -> String { "history".to_owned() }

fn default_path() -> PathBuf { PathBuf::from("~/.local/share/trail/history.db") }

fn default_limit() -> usize { 20 }

/// Runtime configuration for the `trail` binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  #[serde(default = "default_name")]
  pub name:         String,
  /// Database file; `~/` is expanded.
  #[serde(default = "default_path")]
  pub path:         PathBuf,
  /// Ignore `path` and use a throwaway in-memory store.
  #[serde(default)]
  pub in_memory:    bool,
  #[serde(default)]
  pub migration:    MigrationStrategy,
  /// Default for `trail recent` when `--limit` is not given.
  #[serde(default = "default_limit")]
  pub recent_limit: usize,
  /// Default for `trail top` when `--limit` is not given.
  #[serde(default = "default_limit")]
  pub top_limit:    usize,
}

impl Settings {
  /// Layer the optional config file under `TRAIL_*` environment variables.
  pub fn load(config_path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(config_path).required(false))
      .add_source(config::Environment::with_prefix("TRAIL"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  pub fn store_config(&self) -> StoreConfig {
    StoreConfig {
      name:      self.name.clone(),
      path:      (!self.in_memory).then(|| expand_tilde(&self.path)),
      migration: self.migration,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(src: &str) -> Settings {
    config::Config::builder()
      .add_source(config::File::from_str(src, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_apply_to_empty_file() {
    let s = from_toml("");
    assert_eq!(s.name, "history");
    assert_eq!(s.path, PathBuf::from("~/.local/share/trail/history.db"));
    assert!(!s.in_memory);
    assert_eq!(s.migration, MigrationStrategy::Recreate);
    assert_eq!(s.recent_limit, 20);
    assert_eq!(s.top_limit, 20);
  }

  #[test]
  fn default_store_is_persistent() {
    let store = from_toml("").store_config();
    let path = store.path.expect("a database path");
    assert!(path.ends_with(".local/share/trail/history.db"));
  }

  #[test]
  fn in_memory_is_opt_in() {
    let s = from_toml(r#"in_memory = true"#);
    assert_eq!(s.store_config().path, None);
  }

  #[test]
  fn reads_all_fields() {
    let s = from_toml(
      r#"
      name         = "dialer-recents"
      path         = "/var/lib/trail/recents.db"
      migration    = "refuse"
      recent_limit = 50
      top_limit    = 4
      "#,
    );
    assert_eq!(s.name, "dialer-recents");
    assert_eq!(s.recent_limit, 50);
    assert_eq!(s.top_limit, 4);

    let store = s.store_config();
    assert_eq!(store.migration, MigrationStrategy::Refuse);
    assert_eq!(store.path, Some(PathBuf::from("/var/lib/trail/recents.db")));
  }

  #[test]
  fn absolute_paths_are_untouched() {
    assert_eq!(expand_tilde(Path::new("/a/b.db")), PathBuf::from("/a/b.db"));
    assert_eq!(expand_tilde(Path::new("b.db")), PathBuf::from("b.db"));
  }
}
