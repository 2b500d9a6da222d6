use crate::webdriver::{DEFAULT_WEBDRIVER_URL, WebDriverClient, chrome_capabilities};
use async_trait::async_trait;
use fantoccini::Locator;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use snapgrab_engine::config::BrowserConfig;
use snapgrab_engine::session::{BrowserSession, ElementHandle, SessionError};
use tracing::info;

/// A browser session on an external WebDriver server (chromedriver, geckodriver...).
pub struct WebDriverSession {
    client: Option<WebDriverClient>,
    webdriver_url: String,
    headless: bool,
    stealth: bool,
    user_agent: Option<String>,
}

impl WebDriverSession {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_WEBDRIVER_URL)
    }

    pub fn with_url(webdriver_url: impl Into<String>) -> Self {
        Self {
            client: None,
            webdriver_url: webdriver_url.into(),
            headless: true,
            stealth: true,
            user_agent: None,
        }
    }

    pub fn configured(webdriver_url: impl Into<String>, config: &BrowserConfig) -> Self {
        Self {
            headless: !config.visible,
            stealth: config.stealth,
            user_agent: config.stealth.then(|| config.user_agent.clone()),
            ..Self::with_url(webdriver_url)
        }
    }
}

impl Default for WebDriverSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn launch(&mut self) -> Result<(), SessionError> {
        info!("Connecting to WebDriver at {}...", self.webdriver_url);
        let caps = chrome_capabilities(self.headless, self.stealth, self.user_agent.as_deref());
        let client = WebDriverClient::connect(&self.webdriver_url, caps)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SessionError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let client = self.client.as_mut().ok_or(SessionError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .client
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))
    }

    async fn find_all(
        &mut self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, SessionError> {
        let client = self.client.as_ref().ok_or(SessionError::NotReady)?;
        let elements = client
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;

        Ok(elements
            .into_iter()
            .map(|element| Box::new(WebDriverElement { element }) as Box<dyn ElementHandle>)
            .collect())
    }
}

pub struct WebDriverElement {
    element: Element,
}

fn element_error(e: CmdError) -> SessionError {
    SessionError::Element(e.to_string())
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, SessionError> {
        self.element.attr(name).await.map_err(element_error)
    }

    async fn is_visible(&self) -> Result<bool, SessionError> {
        self.element.is_displayed().await.map_err(element_error)
    }

    async fn bounding_size(&self) -> Result<(f64, f64), SessionError> {
        let (_x, _y, width, height) = self.element.rectangle().await.map_err(element_error)?;
        Ok((width, height))
    }

    async fn parent(&self) -> Result<Option<Box<dyn ElementHandle>>, SessionError> {
        match self.element.find(Locator::XPath("parent::*")).await {
            Ok(element) => Ok(Some(Box::new(WebDriverElement { element }))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(element_error(e)),
        }
    }
}
