//! Error types for `trail-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Places are keyed by a URI or phone number; the empty string is neither.
  #[error("place key must not be empty")]
  EmptyKey,

  #[error("timestamp out of range: {0} ms")]
  InvalidTimestamp(i64),

  #[error("invalid store configuration: {0}")]
  InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
