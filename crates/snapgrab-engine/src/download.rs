//! Fetches resolved candidates and writes them to the output directory.

use crate::config::DownloadConfig;
use crate::http::{FetchError, HttpFetcher, HttpResponse};
use crate::resolver::ImageCandidate;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Upper bound on a single retry delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `attempt` (1-based), capped at [`MAX_BACKOFF`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(self.initial_backoff.as_secs_f64() * factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&DownloadConfig> for RetryPolicy {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub byte_count: usize,
}

pub struct Downloader<'a> {
    fetcher: &'a dyn HttpFetcher,
    output_dir: PathBuf,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<'a> Downloader<'a> {
    pub fn new(fetcher: &'a dyn HttpFetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
            timeout: Duration::from_millis(30000),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create the output directory if it does not exist yet.
    pub async fn ensure_output_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await
    }

    /// Fetch one candidate into `<output_dir>/image_<index><ext>`, replacing any
    /// file already there.
    pub async fn download(&self, candidate: &ImageCandidate) -> Result<SavedFile, DownloadError> {
        let response = self.fetch(&candidate.source_url).await?;

        self.ensure_output_dir()
            .await
            .map_err(|source| DownloadError::Io {
                path: self.output_dir.clone(),
                source,
            })?;
        let path = self.output_dir.join(file_name(
            candidate.index,
            &extension_for(&candidate.source_url),
        ));
        tokio::fs::write(&path, &response.body)
            .await
            .map_err(|source| DownloadError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(SavedFile {
            path,
            byte_count: response.body.len(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut attempt = 0;
        loop {
            let result = match self.fetcher.get(url, self.timeout).await {
                Ok(response) if response.is_success() => Ok(response),
                Ok(response) => Err(FetchError::Status {
                    status: response.status,
                    url: url.to_string(),
                }),
                Err(e) => Err(e),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "retry {}/{} for {} in {:?}: {}",
                        attempt, self.retry.max_retries, url, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

pub fn file_name(index: usize, extension: &str) -> String {
    format!("image_{}{}", index, extension)
}

/// Extension of the URL's last path segment, query and fragment ignored.
/// Falls back to [`DEFAULT_EXTENSION`].
pub fn extension_for(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or_default();

    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext)
        }
        _ => {
            debug!("no extension in {}, using {}", url, DEFAULT_EXTENSION);
            DEFAULT_EXTENSION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    #[test]
    fn extension_ignores_query_string() {
        assert_eq!(
            extension_for("https://cdn.shop.com/files/p.png?v=1712&width=2000"),
            ".png"
        );
        assert_eq!(extension_for("https://cdn/x/photo.webp#zoom"), ".webp");
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(extension_for("https://cdn.shop.com/image?id=4"), ".jpg");
        assert_eq!(extension_for("https://cdn.shop.com/"), ".jpg");
        assert_eq!(extension_for("https://cdn.shop.com/.hidden"), ".jpg");
        assert_eq!(extension_for("https://cdn.shop.com/a.b/c"), ".jpg");
    }

    #[test]
    fn extension_from_unparseable_url() {
        assert_eq!(extension_for("relative/pic.gif?x=1"), ".gif");
    }

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn huge_configured_multiplier_caps_backoff() {
        let config =
            ConfigLoader::parse("download:\n  max_retries: 2\n  backoff_multiplier: 1.0e20\n")
                .unwrap();
        let policy = RetryPolicy::from(&config.download);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), MAX_BACKOFF);
        assert_eq!(policy.backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn zero_initial_backoff_never_waits() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::ZERO,
            multiplier: f64::INFINITY,
        };
        assert_eq!(policy.backoff(3), Duration::ZERO);
    }

    #[test]
    fn file_names_are_one_based_indexes() {
        assert_eq!(file_name(1, ".png"), "image_1.png");
    }
}
