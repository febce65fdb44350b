//! Error type for `trail-store-sqlite`.
//!
//! Only [`Error::StorageUnavailable`] and [`Error::OpenFailed`] concern the
//! store as a whole. Every other variant is local to the call that produced
//! it; the store stays open.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] trail_core::Error),

  /// The configured location cannot host a database at all.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("failed to open store: {reason}")]
  OpenFailed {
    reason: String,
    #[source]
    source: Option<tokio_rusqlite::Error>,
  },

  #[error("store is not open")]
  NotOpen,

  #[error("write failed: {0}")]
  WriteFailed(#[source] tokio_rusqlite::Error),

  /// A read failed part-way. Rows collected before the failure are dropped.
  #[error("read failed: {0}")]
  ReadFailed(#[source] tokio_rusqlite::Error),

  #[error("failed to close store: {0}")]
  CloseFailed(#[source] tokio_rusqlite::Error),

  #[error("decode error: {0}")]
  Decode(String),
}

impl Error {
  pub(crate) fn open_failed(
    reason: impl Into<String>,
  ) -> impl FnOnce(tokio_rusqlite::Error) -> Self {
    let reason = reason.into();
    move |source| Self::OpenFailed { reason, source: Some(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
