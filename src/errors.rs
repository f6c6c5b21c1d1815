// src/errors.rs
use std::time::Duration;
use thiserror::Error;

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;

/// Fault taxonomy for the crawl. Everything here is recoverable at some
/// orchestration boundary except the very first page load of a run, which
/// callers propagate as-is.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An expected element is absent. Callers skip and move on.
    #[error("not found: {0}")]
    NotFound(String),

    /// A page did not reach the expected state. Recoverable at the
    /// subtopic/topic boundary.
    #[error("navigation failure: {0}")]
    NavigationFailure(String),

    /// A bounded wait ran out. Treated like NotFound by pagination, but
    /// logged distinctly.
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    /// The enrichment annotator faulted or returned malformed output. The
    /// record is kept with the enrichment left absent.
    #[error("external service failure: {0}")]
    ExternalServiceFailure(String),
}

impl ScrapeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Timeout { .. })
    }
}
