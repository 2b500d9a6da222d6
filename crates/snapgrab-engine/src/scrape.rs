//! The scrape orchestrator.
//!
//! One call owns one browser session from launch to close: select elements,
//! resolve each to a URL, download it, and tally the outcomes. Items are handled
//! one at a time in selection order.

use crate::config::ScrapeConfig;
use crate::download::{Downloader, RetryPolicy};
use crate::error::ScrapeError;
use crate::http::HttpFetcher;
use crate::log::LogSink;
use crate::resolver::{self, Resolution};
use crate::selection::{self, SelectionOptions};
use crate::session::{BrowserSession, ElementHandle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, byte_count: usize },
    Skipped { reason: String },
    Failed { cause: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub used_fallback: bool,
    /// One entry per processed element, in selection order.
    pub outcomes: Vec<DownloadOutcome>,
}

impl Summary {
    fn record(&mut self, outcome: DownloadOutcome) {
        match &outcome {
            DownloadOutcome::Saved { .. } => self.saved += 1,
            DownloadOutcome::Skipped { .. } => self.skipped += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Scrape every image the page offers under `selector` into `output_dir`.
///
/// The session is launched here and closed before returning on every path.
/// Only session-level faults and an unusable output directory are errors.
pub async fn scrape(
    session: &mut dyn BrowserSession,
    fetcher: &dyn HttpFetcher,
    url: &str,
    selector: &str,
    output_dir: &Path,
    config: &ScrapeConfig,
    sink: &dyn LogSink,
) -> Result<Summary, ScrapeError> {
    let result = match session.launch().await {
        Ok(()) => run(session, fetcher, url, selector, output_dir, config, sink).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    if let Err(e) = &result {
        sink.error(&format!("scrape aborted: {}", e));
    }
    result
}

async fn run(
    session: &mut dyn BrowserSession,
    fetcher: &dyn HttpFetcher,
    url: &str,
    selector: &str,
    output_dir: &Path,
    config: &ScrapeConfig,
    sink: &dyn LogSink,
) -> Result<Summary, ScrapeError> {
    info!("Scraping {} with selector '{}'", url, selector);
    let options = SelectionOptions::from(config);
    let selected = selection::select_elements(session, url, selector, &options, sink).await?;

    let mut summary = Summary {
        used_fallback: selected.used_fallback,
        ..Summary::default()
    };

    if selected.is_empty() {
        sink.info("no images found");
        return Ok(summary);
    }
    sink.info(&format!(
        "found {} images{}",
        selected.len(),
        if selected.used_fallback {
            " (fallback heuristic)"
        } else {
            ""
        }
    ));

    let downloader = Downloader::new(fetcher, output_dir)
        .with_timeout(config.download.timeout())
        .with_retry(RetryPolicy::from(&config.download));
    downloader
        .ensure_output_dir()
        .await
        .map_err(|source| ScrapeError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

    for (position, element) in selected.elements.iter().enumerate() {
        let outcome = process(
            element.as_ref(),
            position + 1,
            &downloader,
            &config.placeholder_tokens,
            sink,
        )
        .await;
        summary.record(outcome);
    }

    sink.info(&format!(
        "done: {} saved, {} skipped, {} failed in {}",
        summary.saved,
        summary.skipped,
        summary.failed,
        output_dir.display()
    ));
    Ok(summary)
}

async fn process(
    element: &dyn ElementHandle,
    index: usize,
    downloader: &Downloader<'_>,
    placeholder_tokens: &[String],
    sink: &dyn LogSink,
) -> DownloadOutcome {
    let candidate = match resolver::resolve(element, index, placeholder_tokens).await {
        Resolution::Found(candidate) => candidate,
        Resolution::Skipped(reason) => {
            sink.warn(&format!("image {} skipped: {}", index, reason));
            return DownloadOutcome::Skipped {
                reason: reason.to_string(),
            };
        }
    };

    sink.info(&format!(
        "downloading image {}: {}",
        index, candidate.source_url
    ));
    match downloader.download(&candidate).await {
        Ok(saved) => {
            sink.info(&format!(
                "saved {} ({} bytes)",
                saved.path.display(),
                saved.byte_count
            ));
            DownloadOutcome::Saved {
                path: saved.path,
                byte_count: saved.byte_count,
            }
        }
        Err(e) => {
            sink.error(&format!(
                "download failed for {}: {}",
                candidate.source_url, e
            ));
            DownloadOutcome::Failed {
                cause: e.to_string(),
            }
        }
    }
}
