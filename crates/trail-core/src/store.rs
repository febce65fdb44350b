//! The `VisitStore` trait and its lifecycle state.
//!
//! The trait is implemented by storage backends (e.g. `trail-store-sqlite`).
//! Callers such as `trail-cli` depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::history::{HistoryEntry, Place, Visit};

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Where a store is in its open/close lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
  Closed,
  /// Connection established, schema initialisation or migration in progress.
  Opening,
  Open,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a visit history backend.
///
/// Visits are append-only. Places are upserted: recording a visit creates the
/// place if it is missing, and titles can be set independently afterwards.
///
/// Every operation other than [`open`](VisitStore::open) and
/// [`close`](VisitStore::close) fails immediately unless the store is
/// [`StoreState::Open`]; nothing is queued.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait VisitStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn state(&self) -> StoreState;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Establish the connection and make sure the schema is current.
  ///
  /// Opening an already open store succeeds without touching its data.
  fn open(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Release the connection. Closing a closed store is a no-op.
  fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Record a visit to `key` happening now.
  fn record_visit<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + 'a {
    self.record_visit_at(key, Utc::now())
  }

  /// Record a visit to `key` at a caller-supplied time.
  ///
  /// Creates the place titled with its key if it does not exist yet; an
  /// existing title is left alone. The place write and the visit append are
  /// one atomic unit.
  fn record_visit_at<'a>(
    &'a self,
    key: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + 'a;

  /// Set the title of `key`, creating the place if needed. Always overwrites.
  fn set_title<'a>(
    &'a self,
    key: &'a str,
    title: &'a str,
  ) -> impl Future<Output = Result<Place, Self::Error>> + Send + 'a;

  /// Delete a place. Its visits stay in the log. Returns whether a place was
  /// removed.
  ///
  /// Recording a visit or setting a title for the key later re-creates the
  /// place with a visit count that includes the visits still in the log; the
  /// old title is gone.
  fn remove_place<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Clear every visit and place. Returns the number of visits removed.
  fn clear_history(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_ {
    self.clear_history_excluding(&[])
  }

  /// Clear every visit and every place except those in `keep`. Kept places
  /// retain their titles and have their visit counts reset to zero.
  fn clear_history_excluding<'a>(
    &'a self,
    keep: &'a [&'a str],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The most recent `limit` visits joined with their place titles, newest
  /// first. Visits sharing a timestamp come back in reverse insertion order.
  fn recent_history(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  fn get_place<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Place>, Self::Error>> + Send + 'a;

  /// Most visited places first. `filter` is a case-insensitive substring
  /// matched against key and title.
  fn top_places<'a>(
    &'a self,
    limit: usize,
    filter: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Place>, Self::Error>> + Send + 'a;

  /// Total number of visits in the log.
  fn visit_count(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
