//! Places, visits, and the joined history read model.
//!
//! A place is the thing being visited (a URI, a phone number). A visit is an
//! immutable, timestamped reference to a place key. Visits are never updated;
//! the only mutation a place sees is a title change or its visit counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Records ─────────────────────────────────────────────────────────────────

/// A unique, titled entity that can be visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
  pub key:         String,
  /// Human-readable label. Equal to `key` until a title is set.
  pub title:       String,
  /// Number of visits recorded against this place.
  pub visit_count: u64,
}

impl Place {
  /// A freshly seen place, titled with its own key.
  pub fn untitled(key: impl Into<String>) -> Self {
    let key = key.into();
    Self { title: key.clone(), key, visit_count: 0 }
  }
}

/// A single visit event. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  /// Assigned by the store; strictly increasing in insertion order.
  pub visit_id:   i64,
  pub place_key:  String,
  pub visited_at: DateTime<Utc>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// One row of recent history: a visit joined with its place's title.
///
/// Computed on read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub key:        String,
  pub title:      String,
  pub visited_at: DateTime<Utc>,
}

impl HistoryEntry {
  /// Join a visit with the title of its place, if the place still exists.
  ///
  /// Visits may outlive their place; the key then doubles as the title.
  pub fn join(
    place_key: String,
    title: Option<String>,
    visited_at: DateTime<Utc>,
  ) -> Self {
    let title = title.unwrap_or_else(|| place_key.clone());
    Self { key: place_key, title, visited_at }
  }
}

// ─── Validation & encoding ───────────────────────────────────────────────────

/// Reject keys that cannot identify a place.
pub fn validate_key(key: &str) -> Result<()> {
  if key.is_empty() {
    return Err(Error::EmptyKey);
  }
  Ok(())
}

/// Timestamps are persisted as integer epoch milliseconds.
pub fn to_millis(at: DateTime<Utc>) -> i64 { at.timestamp_millis() }

pub fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or(Error::InvalidTimestamp(ms))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn untitled_place_uses_key_as_title() {
    let place = Place::untitled("http://example.com/");
    assert_eq!(place.title, "http://example.com/");
    assert_eq!(place.visit_count, 0);
  }

  #[test]
  fn join_falls_back_to_key_without_place() {
    let at = from_millis(100).unwrap();
    let entry = HistoryEntry::join("555-1234".into(), None, at);
    assert_eq!(entry.title, "555-1234");

    let entry = HistoryEntry::join("555-1234".into(), Some("Alice".into()), at);
    assert_eq!(entry.title, "Alice");
    assert_eq!(entry.key, "555-1234");
  }

  #[test]
  fn empty_key_is_rejected() {
    assert!(matches!(validate_key(""), Err(Error::EmptyKey)));
    assert!(validate_key("555-1234").is_ok());
  }

  #[test]
  fn millis_roundtrip_and_out_of_range() {
    let at = from_millis(1_700_000_000_123).unwrap();
    assert_eq!(to_millis(at), 1_700_000_000_123);
    assert!(matches!(from_millis(i64::MAX), Err(Error::InvalidTimestamp(_))));
  }

  #[test]
  fn history_entry_serializes_flat() {
    let entry = HistoryEntry::join("a".into(), None, from_millis(0).unwrap());
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["key"], "a");
    assert_eq!(json["title"], "a");
    assert!(json["visited_at"].is_string());
  }
}
