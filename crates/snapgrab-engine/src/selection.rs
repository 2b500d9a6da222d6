//! Element selection: explicit selector first, size/visibility heuristic second.

use crate::config::{FallbackConfig, ScrapeConfig};
use crate::log::LogSink;
use crate::session::{BrowserSession, ElementHandle, SessionError};
use rand::Rng;
use std::time::Duration;
use tracing::debug;

pub struct SelectorResult {
    pub elements: Vec<Box<dyn ElementHandle>>,
    pub used_fallback: bool,
}

impl SelectorResult {
    pub fn empty(used_fallback: bool) -> Self {
        Self {
            elements: Vec::new(),
            used_fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionOptions {
    pub wait_timeout: Duration,
    pub settle_delay_min: Duration,
    pub settle_delay_max: Duration,
    pub fallback: FallbackConfig,
}

impl From<&ScrapeConfig> for SelectionOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            wait_timeout: config.wait_timeout(),
            settle_delay_min: Duration::from_millis(config.settle_delay_min_ms),
            settle_delay_max: Duration::from_millis(config.settle_delay_max_ms),
            fallback: config.fallback.clone(),
        }
    }
}

impl SelectionOptions {
    /// A random delay within the configured settle window.
    pub fn settle_delay(&self) -> Duration {
        let min = self.settle_delay_min.as_millis() as u64;
        let max = (self.settle_delay_max.as_millis() as u64).max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Navigate to `url` and pick the elements to scrape.
///
/// Navigation failures and fallback query failures propagate. A wait that runs
/// out of budget only means nothing matched.
pub async fn select_elements(
    session: &mut dyn BrowserSession,
    url: &str,
    selector: &str,
    options: &SelectionOptions,
    sink: &dyn LogSink,
) -> Result<SelectorResult, SessionError> {
    session.navigate(url).await?;

    let delay = options.settle_delay();
    if !delay.is_zero() {
        debug!("settling for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    match explicit_matches(session, selector, options.wait_timeout).await {
        Ok(elements) if !elements.is_empty() => {
            return Ok(SelectorResult {
                elements,
                used_fallback: false,
            });
        }
        Ok(_) => sink.warn(&format!(
            "selector '{}' matched nothing, falling back to image heuristic",
            selector
        )),
        Err(e) => sink.warn(&format!(
            "selector '{}' failed ({}), falling back to image heuristic",
            selector, e
        )),
    }

    let fallback = &options.fallback;
    if !session
        .wait_for(&fallback.image_tag, options.wait_timeout)
        .await?
    {
        return Ok(SelectorResult::empty(true));
    }

    let mut survivors = Vec::new();
    for element in session.find_all(&fallback.image_tag).await? {
        match passes_fallback(element.as_ref(), fallback).await {
            Ok(true) => survivors.push(element),
            Ok(false) => {}
            Err(e) => sink.warn(&format!("ignoring unreadable element: {}", e)),
        }
    }
    debug!("fallback kept {} elements", survivors.len());

    Ok(SelectorResult {
        elements: survivors,
        used_fallback: true,
    })
}

async fn explicit_matches(
    session: &mut dyn BrowserSession,
    selector: &str,
    timeout: Duration,
) -> Result<Vec<Box<dyn ElementHandle>>, SessionError> {
    if !session.wait_for(selector, timeout).await? {
        return Ok(Vec::new());
    }
    session.find_all(selector).await
}

/// Visible, large enough, and not marked as a decoy on itself or its parent.
pub async fn passes_fallback(
    element: &dyn ElementHandle,
    config: &FallbackConfig,
) -> Result<bool, SessionError> {
    if !element.is_visible().await? {
        return Ok(false);
    }

    let (width, height) = element.bounding_size().await?;
    if width < f64::from(config.min_width) || height < f64::from(config.min_height) {
        return Ok(false);
    }

    if has_decoy_class(&element.classes().await?, &config.decoy_keywords) {
        return Ok(false);
    }

    if let Some(parent) = element.parent().await? {
        if has_decoy_class(&parent.classes().await?, &config.decoy_keywords) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// True when any class name contains any keyword, ignoring case.
pub fn has_decoy_class(classes: &[String], keywords: &[String]) -> bool {
    classes.iter().any(|class| {
        let class = class.to_ascii_lowercase();
        keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| class.contains(&k.to_ascii_lowercase()))
    })
}
