use crate::error::{Result, RetrievalError};
use crate::result::{RetrievalResult, RetrievalSource};
use tokio_util::sync::CancellationToken;

/// Documents processed between two cancellation checks
pub(crate) const CANCEL_CHECK_INTERVAL: usize = 256;

/// A ranked-list producer.
///
/// Implementations are pure functions of `(query, corpus)`: they rebuild any
/// statistics they need on every call and keep no state between calls, so one
/// instance can serve concurrent callers.
pub trait Retriever: Send + Sync {
    fn source(&self) -> RetrievalSource;

    /// Rank `corpus` against `query`, best first, at most `limit` entries.
    ///
    /// Long-running work must poll `cancel` and return
    /// [`RetrievalError::Cancelled`] once it fires.
    fn search(
        &self,
        query: &str,
        corpus: &[String],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>>;
}

pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(RetrievalError::Cancelled);
    }
    Ok(())
}

/// Check `cancel` every [`CANCEL_CHECK_INTERVAL`] iterations.
pub(crate) fn check_cancelled_at(index: usize, cancel: &CancellationToken) -> Result<()> {
    if index % CANCEL_CHECK_INTERVAL == 0 {
        check_cancelled(cancel)?;
    }
    Ok(())
}
