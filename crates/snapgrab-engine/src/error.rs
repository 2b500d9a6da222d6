use crate::session::SessionError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole scrape. Per-image faults never surface here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Browser session failed: {0}")]
    Session(#[from] SessionError),
    #[error("Cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
