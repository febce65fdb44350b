//! [`SqliteVisitStore`], the SQLite implementation of [`VisitStore`].

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;

use trail_core::{
  config::StoreConfig,
  history::{HistoryEntry, Place, Visit, to_millis, validate_key},
  store::{StoreState, VisitStore},
};

use crate::{
  Error, Result,
  encode::{RawHistoryRow, RawPlace, RawVisit, decode_count, encode_limit},
  schema::{self, CONNECTION_PRAGMAS, CREATE_SCHEMA, DROP_SCHEMA, SchemaPlan},
};

// ─── Lifecycle ───────────────────────────────────────────────────────────────

enum Lifecycle {
  Closed,
  Opening,
  Open(Connection),
}

struct Inner {
  config:     StoreConfig,
  lifecycle:  RwLock<Lifecycle>,
  /// Serialises `open` and `close` so concurrent callers never race a
  /// half-initialised connection.
  transition: Mutex<()>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A visit store backed by a single SQLite database.
///
/// Cloning is cheap; clones share the same connection and lifecycle.
#[derive(Clone)]
pub struct SqliteVisitStore {
  inner: Arc<Inner>,
}

impl SqliteVisitStore {
  /// Build a closed store from `config`. Nothing touches the disk until
  /// [`open`](VisitStore::open).
  pub fn new(config: StoreConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      inner: Arc::new(Inner {
        config,
        lifecycle: RwLock::new(Lifecycle::Closed),
        transition: Mutex::new(()),
      }),
    })
  }

  /// Build and open an in-memory store — useful for testing.
  pub async fn open_in_memory(name: &str) -> Result<Self> {
    let store = Self::new(StoreConfig::in_memory(name))?;
    store.open().await?;
    Ok(store)
  }

  pub fn config(&self) -> &StoreConfig { &self.inner.config }

  fn replace_lifecycle(&self, next: Lifecycle) -> Lifecycle {
    let mut guard =
      self.inner.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, next)
  }

  /// The live connection, or [`Error::NotOpen`].
  fn connection(&self) -> Result<Connection> {
    let guard =
      self.inner.lifecycle.read().unwrap_or_else(PoisonError::into_inner);
    match &*guard {
      Lifecycle::Open(conn) => Ok(conn.clone()),
      Lifecycle::Closed | Lifecycle::Opening => Err(Error::NotOpen),
    }
  }

  async fn connect(&self) -> Result<Connection> {
    let Some(path) = self.inner.config.path.clone() else {
      return Connection::open_in_memory()
        .await
        .map_err(Error::open_failed("could not open in-memory database"));
    };

    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
      && !parent.is_dir()
    {
      return Err(Error::StorageUnavailable(format!(
        "directory {} does not exist",
        parent.display()
      )));
    }

    let display = path.display().to_string();
    Connection::open(path)
      .await
      .map_err(Error::open_failed(format!("could not open {display}")))
  }

  /// Bring the schema of a fresh connection up to [`schema::SCHEMA_VERSION`].
  async fn prepare_schema(&self, conn: &Connection) -> Result<()> {
    let found: i64 = conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
      })
      .await
      .map_err(Error::open_failed("could not read schema version"))?;

    let plan = schema::plan(found, self.inner.config.migration)
      .map_err(|reason| Error::OpenFailed { reason, source: None })?;

    match plan {
      SchemaPlan::UpToDate => return Ok(()),
      SchemaPlan::Create => {
        tracing::info!(store = %self.inner.config.name, "initialising schema");
      }
      SchemaPlan::Recreate { from } => {
        tracing::info!(
          store = %self.inner.config.name,
          from,
          to = schema::SCHEMA_VERSION,
          "schema is stale; dropping and recreating history"
        );
      }
    }

    conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if matches!(plan, SchemaPlan::Recreate { .. }) {
          tx.execute_batch(DROP_SCHEMA)?;
        }
        tx.execute_batch(CREATE_SCHEMA)?;
        tx.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::open_failed("could not initialise schema"))
  }
}

// ─── VisitStore impl ─────────────────────────────────────────────────────────

impl VisitStore for SqliteVisitStore {
  type Error = Error;

  fn state(&self) -> StoreState {
    let guard =
      self.inner.lifecycle.read().unwrap_or_else(PoisonError::into_inner);
    match &*guard {
      Lifecycle::Closed => StoreState::Closed,
      Lifecycle::Opening => StoreState::Opening,
      Lifecycle::Open(_) => StoreState::Open,
    }
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn open(&self) -> Result<()> {
    let _transition = self.inner.transition.lock().await;

    if self.state() == StoreState::Open {
      tracing::debug!(store = %self.inner.config.name, "store already open");
      return Ok(());
    }

    self.replace_lifecycle(Lifecycle::Opening);

    let prepared = match self.connect().await {
      Ok(conn) => self.prepare_schema(&conn).await.map(|()| conn),
      Err(e) => Err(e),
    };

    match prepared {
      Ok(conn) => {
        self.replace_lifecycle(Lifecycle::Open(conn));
        tracing::info!(store = %self.inner.config.name, "store open");
        Ok(())
      }
      Err(e) => {
        self.replace_lifecycle(Lifecycle::Closed);
        tracing::warn!(store = %self.inner.config.name, error = %e, "failed to open store");
        Err(e)
      }
    }
  }

  async fn close(&self) -> Result<()> {
    let _transition = self.inner.transition.lock().await;

    let Lifecycle::Open(conn) = self.replace_lifecycle(Lifecycle::Closed) else {
      return Ok(());
    };

    conn.close().await.map_err(Error::CloseFailed)?;
    tracing::info!(store = %self.inner.config.name, "store closed");
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn record_visit_at(&self, key: &str, at: DateTime<Utc>) -> Result<Visit> {
    validate_key(key)?;
    let conn = self.connection()?;

    let place_key  = key.to_owned();
    let visited_at = to_millis(at);

    let raw: RawVisit = conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the place upsert and the
        // visit append cannot interleave with another writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // A place removed earlier may still have visits in the log; a
        // re-created place starts from that count.
        tx.execute(
          "INSERT INTO places (place_key, title, visit_count)
           VALUES (?1, ?1, 1 + (SELECT COUNT(*) FROM visits WHERE place_key = ?1))
           ON CONFLICT (place_key) DO UPDATE SET visit_count = visit_count + 1",
          rusqlite::params![place_key],
        )?;
        tx.execute(
          "INSERT INTO visits (place_key, visited_at) VALUES (?1, ?2)",
          rusqlite::params![place_key, visited_at],
        )?;
        let visit_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(RawVisit { visit_id, place_key, visited_at })
      })
      .await
      .map_err(Error::WriteFailed)?;

    tracing::debug!(store = %self.inner.config.name, key, visit_id = raw.visit_id, "recorded visit");
    raw.into_visit()
  }

  async fn set_title(&self, key: &str, title: &str) -> Result<Place> {
    validate_key(key)?;
    let conn = self.connection()?;

    let place_key = key.to_owned();
    let title     = title.to_owned();

    let raw: RawPlace = conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO places (place_key, title, visit_count)
           VALUES (?1, ?2, (SELECT COUNT(*) FROM visits WHERE place_key = ?1))
           ON CONFLICT (place_key) DO UPDATE SET title = excluded.title
           RETURNING place_key, title, visit_count",
          rusqlite::params![place_key, title],
          RawPlace::from_row,
        )?)
      })
      .await
      .map_err(Error::WriteFailed)?;

    tracing::debug!(store = %self.inner.config.name, key, "set place title");
    raw.into_place()
  }

  async fn remove_place(&self, key: &str) -> Result<bool> {
    validate_key(key)?;
    let conn = self.connection()?;
    let place_key = key.to_owned();

    let removed = conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM places WHERE place_key = ?1",
          rusqlite::params![place_key],
        )?)
      })
      .await
      .map_err(Error::WriteFailed)?;

    Ok(removed > 0)
  }

  async fn clear_history_excluding(&self, keep: &[&str]) -> Result<u64> {
    let conn = self.connection()?;
    let keep: Vec<String> = keep.iter().map(|k| (*k).to_owned()).collect();

    let removed = conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let visits = tx.execute("DELETE FROM visits", [])?;
        if keep.is_empty() {
          tx.execute("DELETE FROM places", [])?;
        } else {
          let placeholders = vec!["?"; keep.len()].join(", ");
          tx.execute(
            &format!("DELETE FROM places WHERE place_key NOT IN ({placeholders})"),
            rusqlite::params_from_iter(keep.iter()),
          )?;
          tx.execute("UPDATE places SET visit_count = 0", [])?;
        }
        tx.commit()?;
        Ok(visits)
      })
      .await
      .map_err(Error::WriteFailed)?;

    tracing::info!(store = %self.inner.config.name, removed, "cleared history");
    Ok(removed as u64)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
    let conn = self.connection()?;
    if limit == 0 {
      return Ok(Vec::new());
    }

    let raws: Vec<RawHistoryRow> = conn
      .call(move |conn| {
        // One read transaction so the visit scan and the place lookups see
        // the same snapshot.
        let tx = conn.transaction()?;
        let mut rows = Vec::with_capacity(limit.min(256));
        {
          // Walks visits_visited_at_idx backwards; the rowid tiebreak comes
          // for free because index entries end with it.
          let mut visits = tx.prepare(
            "SELECT place_key, visited_at FROM visits
             ORDER BY visited_at DESC, visit_id DESC",
          )?;
          let mut place_title =
            tx.prepare("SELECT title FROM places WHERE place_key = ?1")?;

          let mut cursor = visits.query([])?;
          while rows.len() < limit {
            let Some(row) = cursor.next()? else { break };
            let place_key: String = row.get(0)?;
            let visited_at: i64 = row.get(1)?;
            let title: Option<String> = place_title
              .query_row(rusqlite::params![place_key], |r| r.get(0))
              .optional()?;
            rows.push(RawHistoryRow { place_key, title, visited_at });
          }
        }
        tx.commit()?;
        Ok(rows)
      })
      .await
      .map_err(Error::ReadFailed)?;

    raws.into_iter().map(RawHistoryRow::into_entry).collect()
  }

  async fn get_place(&self, key: &str) -> Result<Option<Place>> {
    validate_key(key)?;
    let conn = self.connection()?;
    let place_key = key.to_owned();

    let raw: Option<RawPlace> = conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT place_key, title, visit_count FROM places WHERE place_key = ?1",
            rusqlite::params![place_key],
            RawPlace::from_row,
          )
          .optional()?)
      })
      .await
      .map_err(Error::ReadFailed)?;

    raw.map(RawPlace::into_place).transpose()
  }

  async fn top_places(&self, limit: usize, filter: Option<&str>) -> Result<Vec<Place>> {
    let conn = self.connection()?;
    if limit == 0 {
      return Ok(Vec::new());
    }

    let filter    = filter.filter(|f| !f.is_empty()).map(str::to_owned);
    let limit_val = encode_limit(limit);

    let raws: Vec<RawPlace> = conn
      .call(move |conn| {
        // Places only ever titled, never visited, are not candidates.
        let mut stmt = conn.prepare(
          "SELECT place_key, title, visit_count FROM places
           WHERE visit_count > 0
             AND (?1 IS NULL
                  OR instr(lower(place_key), lower(?1)) > 0
                  OR instr(lower(title),     lower(?1)) > 0)
           ORDER BY visit_count DESC, place_key ASC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![filter, limit_val], RawPlace::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::ReadFailed)?;

    raws.into_iter().map(RawPlace::into_place).collect()
  }

  async fn visit_count(&self) -> Result<u64> {
    let conn = self.connection()?;

    let n: i64 = conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM visits", [], |r| r.get(0))?))
      .await
      .map_err(Error::ReadFailed)?;

    decode_count(n)
  }
}
