//! Fire-and-forget writes.
//!
//! UI code typically records a visit or a late-arriving title without waiting
//! for the result. These helpers spawn the write on the current tokio runtime
//! and log failures instead of returning them.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::store::VisitStore;

/// Spawn [`VisitStore::record_visit`] for `key`. Must be called from within a
/// tokio runtime.
pub fn record_visit_detached<S>(
  store: Arc<S>,
  key: impl Into<String>,
) -> JoinHandle<()>
where
  S: VisitStore + 'static,
{
  let key = key.into();
  tokio::spawn(async move {
    if let Err(e) = store.record_visit(&key).await {
      tracing::warn!(key = %key, error = %e, "failed to record visit");
    }
  })
}

/// Spawn [`VisitStore::set_title`] for `key`. Must be called from within a
/// tokio runtime.
pub fn set_title_detached<S>(
  store: Arc<S>,
  key: impl Into<String>,
  title: impl Into<String>,
) -> JoinHandle<()>
where
  S: VisitStore + 'static,
{
  let key = key.into();
  let title = title.into();
  tokio::spawn(async move {
    if let Err(e) = store.set_title(&key, &title).await {
      tracing::warn!(key = %key, error = %e, "failed to set title");
    }
  })
}
