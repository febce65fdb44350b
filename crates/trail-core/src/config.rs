//! Store configuration.
//!
//! One [`StoreConfig`] describes one independent store. Browser history and
//! dialer recents are two configs with different names and paths; they never
//! share a connection or tables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What to do when the persisted schema is older than the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStrategy {
  /// Drop both collections and recreate them empty. Lossy; suitable for a
  /// recent-history cache.
  #[default]
  Recreate,
  /// Refuse to open and leave the stored data untouched.
  Refuse,
}

/// Configuration for a single visit store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
  /// Logical store name, used in logs (e.g. `"browser-history"`).
  pub name:      String,
  /// Database file. `None` keeps the store in memory.
  #[serde(default)]
  pub path:      Option<PathBuf>,
  #[serde(default)]
  pub migration: MigrationStrategy,
}

impl StoreConfig {
  /// An in-memory store, mostly useful for tests.
  pub fn in_memory(name: impl Into<String>) -> Self {
    Self {
      name:      name.into(),
      path:      None,
      migration: MigrationStrategy::default(),
    }
  }

  /// A store persisted at `path`.
  pub fn at_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name:      name.into(),
      path:      Some(path.into()),
      migration: MigrationStrategy::default(),
    }
  }

  pub fn with_migration(mut self, migration: MigrationStrategy) -> Self {
    self.migration = migration;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidConfig("store name must not be empty".into()));
    }
    if let Some(path) = &self.path
      && path.as_os_str().is_empty()
    {
      return Err(Error::InvalidConfig(format!(
        "store {:?} has an empty path",
        self.name
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_with_defaults() {
    let cfg: StoreConfig =
      serde_json::from_str(r#"{ "name": "dialer-recents" }"#).unwrap();
    assert_eq!(cfg, StoreConfig::in_memory("dialer-recents"));
  }

  #[test]
  fn deserializes_migration_strategy() {
    let cfg: StoreConfig = serde_json::from_str(
      r#"{ "name": "contacts", "path": "/tmp/c.db", "migration": "refuse" }"#,
    )
    .unwrap();
    assert_eq!(cfg.migration, MigrationStrategy::Refuse);
    assert_eq!(cfg.path, Some(PathBuf::from("/tmp/c.db")));
  }

  #[test]
  fn validate_rejects_blank_name_and_empty_path() {
    assert!(StoreConfig::in_memory("  ").validate().is_err());
    assert!(StoreConfig::at_path("h", "").validate().is_err());
    assert!(StoreConfig::at_path("h", "h.db").validate().is_ok());
  }
}
