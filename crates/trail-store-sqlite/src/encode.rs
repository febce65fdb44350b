//! Conversions between SQLite column values and `trail-core` domain types.
//!
//! Rows are read into plain `Raw*` structs inside the connection closure and
//! decoded afterwards, so decode errors surface as [`Error`] rather than as
//! `rusqlite` errors.

use trail_core::history::{HistoryEntry, Place, Visit, from_millis};

use crate::{Error, Result};

// ─── Integers ────────────────────────────────────────────────────────────────

/// SQLite `LIMIT` takes a signed integer; anything larger means "no limit".
pub fn encode_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative count: {n}")))
}

// ─── Places ──────────────────────────────────────────────────────────────────

pub struct RawPlace {
  pub place_key:   String,
  pub title:       String,
  pub visit_count: i64,
}

impl RawPlace {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      place_key:   row.get(0)?,
      title:       row.get(1)?,
      visit_count: row.get(2)?,
    })
  }

  pub fn into_place(self) -> Result<Place> {
    Ok(Place {
      key:         self.place_key,
      title:       self.title,
      visit_count: decode_count(self.visit_count)?,
    })
  }
}

// ─── Visits ──────────────────────────────────────────────────────────────────

pub struct RawVisit {
  pub visit_id:   i64,
  pub place_key:  String,
  pub visited_at: i64,
}

impl RawVisit {
  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:   self.visit_id,
      place_key:  self.place_key,
      visited_at: from_millis(self.visited_at)?,
    })
  }
}

/// A visit joined with the title of its place, if the place exists.
pub struct RawHistoryRow {
  pub place_key:  String,
  pub title:      Option<String>,
  pub visited_at: i64,
}

impl RawHistoryRow {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry::join(
      self.place_key,
      self.title,
      from_millis(self.visited_at)?,
    ))
  }
}
