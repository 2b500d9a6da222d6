#![allow(dead_code)]

use async_trait::async_trait;
use snapgrab_engine::config::ScrapeConfig;
use snapgrab_engine::http::{FetchError, HttpFetcher, HttpResponse};
use snapgrab_engine::session::{BrowserSession, ElementHandle, SessionError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub size: (f64, f64),
    pub parent: Option<Box<FakeElement>>,
    pub broken: bool,
}

impl FakeElement {
    /// A visible 800x800 element.
    pub fn image() -> Self {
        Self {
            visible: true,
            size: (800.0, 800.0),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn inside(mut self, parent: FakeElement) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    fn check(&self) -> Result<(), SessionError> {
        if self.broken {
            return Err(SessionError::Element("node detached".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.check()?;
        Ok(self.attrs.get(name).cloned())
    }

    async fn is_visible(&self) -> Result<bool, SessionError> {
        self.check()?;
        Ok(self.visible)
    }

    async fn bounding_size(&self) -> Result<(f64, f64), SessionError> {
        self.check()?;
        Ok(self.size)
    }

    async fn parent(&self) -> Result<Option<Box<dyn ElementHandle>>, SessionError> {
        self.check()?;
        Ok(self
            .parent
            .clone()
            .map(|p| p as Box<dyn ElementHandle>))
    }
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub pages: HashMap<String, Vec<FakeElement>>,
    pub fail_launch: bool,
    pub fail_navigation: bool,
    pub launched: usize,
    pub closed: usize,
    pub navigated: Vec<String>,
    pub queries: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.pages.insert(selector.to_string(), elements);
        self
    }

    pub fn queried(&self, selector: &str) -> bool {
        self.queries.iter().any(|q| q == selector)
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn launch(&mut self) -> Result<(), SessionError> {
        self.launched += 1;
        if self.fail_launch {
            return Err(SessionError::Launch("no browser binary".into()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed += 1;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.launched > self.closed
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if self.fail_navigation {
            return Err(SessionError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED {}", url)));
        }
        self.navigated.push(url.to_string());
        Ok(())
    }

    async fn find_all(
        &mut self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, SessionError> {
        self.queries.push(selector.to_string());
        Ok(self
            .pages
            .get(selector)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn ElementHandle>)
            .collect())
    }
}

/// Serves canned responses; unknown URLs fail at the transport level.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, VecDeque<(u16, Vec<u8>)>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, status: u16, body: &[u8]) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back((status, body.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(url)
            .ok_or_else(|| FetchError::Transport(format!("connection refused: {}", url)))?;
        let (status, body) = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        Ok(HttpResponse { status, body })
    }
}

/// Defaults with no settle delay and a short wait budget.
pub fn fast_config() -> ScrapeConfig {
    ScrapeConfig {
        wait_timeout_ms: 50,
        settle_delay_min_ms: 0,
        settle_delay_max_ms: 0,
        ..ScrapeConfig::default()
    }
}
