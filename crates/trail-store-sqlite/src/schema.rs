//! SQL schema for the Trail SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`. Zero means the database
//! has never been initialised. Anything between zero and [`SCHEMA_VERSION`] is
//! stale and handled according to the store's [`MigrationStrategy`].

use trail_core::config::MigrationStrategy;

/// Current schema version. Version 1 predates the visit counter on places.
pub const SCHEMA_VERSION: i64 = 2;

/// Applied on every connection, before the version check.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous  = NORMAL;
";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`. The version marker
/// is written separately, in the same transaction.
pub const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS places (
    place_key   TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    visit_count INTEGER NOT NULL DEFAULT 0
);

-- Visits are append-only. place_key deliberately has no foreign key:
-- a place may be removed while its visits remain.
CREATE TABLE IF NOT EXISTS visits (
    visit_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    place_key   TEXT NOT NULL,
    visited_at  INTEGER NOT NULL    -- epoch milliseconds, UTC
);

CREATE INDEX IF NOT EXISTS visits_visited_at_idx  ON visits(visited_at);
CREATE INDEX IF NOT EXISTS visits_place_key_idx   ON visits(place_key);
CREATE INDEX IF NOT EXISTS places_visit_count_idx ON places(visit_count);
";

/// Removes everything [`CREATE_SCHEMA`] creates.
pub const DROP_SCHEMA: &str = "
DROP INDEX IF EXISTS visits_visited_at_idx;
DROP INDEX IF EXISTS visits_place_key_idx;
DROP INDEX IF EXISTS places_visit_count_idx;
DROP TABLE IF EXISTS visits;
DROP TABLE IF EXISTS places;
";

/// What opening a database at a given version requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPlan {
  UpToDate,
  Create,
  /// Drop and recreate. Loses all stored history.
  Recreate { from: i64 },
}

/// Decide how to bring a database at version `found` up to date, or why it
/// cannot be opened.
pub fn plan(found: i64, strategy: MigrationStrategy) -> Result<SchemaPlan, String> {
  match found {
    0 => Ok(SchemaPlan::Create),
    v if v == SCHEMA_VERSION => Ok(SchemaPlan::UpToDate),
    v if v > SCHEMA_VERSION => Err(format!(
      "schema version {v} is newer than supported version {SCHEMA_VERSION}"
    )),
    v if v < 0 => Err(format!("invalid schema version {v}")),
    v => match strategy {
      MigrationStrategy::Recreate => Ok(SchemaPlan::Recreate { from: v }),
      MigrationStrategy::Refuse => Err(format!(
        "schema version {v} is stale (current {SCHEMA_VERSION}) and migration is set to refuse"
      )),
    },
  }
}
