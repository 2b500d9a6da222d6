use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Poll interval used by the default `wait_for` implementation.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Browser launch failed: {0}")]
    Launch(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Session not ready")]
    NotReady,
    #[error("Query for '{selector}' failed: {reason}")]
    Query { selector: String, reason: String },
    #[error("Element inspection failed: {0}")]
    Element(String),
    #[error("Other: {0}")]
    Other(String),
}

/// A rendered page element, borrowed from the session for one scrape.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Read an attribute. `Ok(None)` when the attribute is absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError>;

    async fn is_visible(&self) -> Result<bool, SessionError>;

    /// Rendered `(width, height)` in CSS pixels.
    async fn bounding_size(&self) -> Result<(f64, f64), SessionError>;

    /// The immediate parent element, if any.
    async fn parent(&self) -> Result<Option<Box<dyn ElementHandle>>, SessionError>;

    /// Whitespace-separated class list.
    async fn classes(&self) -> Result<Vec<String>, SessionError> {
        Ok(self
            .attribute("class")
            .await?
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }
}

/// The browser collaborator every backend crate implements.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Start the browser (or attach to a remote one).
    async fn launch(&mut self) -> Result<(), SessionError>;

    /// Release the browser and any resources it holds.
    async fn close(&mut self) -> Result<(), SessionError>;

    async fn is_ready(&self) -> bool;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// All elements matching a CSS selector (a bare tag name is a valid selector).
    async fn find_all(
        &mut self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, SessionError>;

    /// Wait until at least one element matches `selector`.
    ///
    /// Returns `Ok(false)` when the budget runs out; timing out is not an error.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.find_all(selector).await?.is_empty() {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
