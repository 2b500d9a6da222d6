use crate::cdp::{CdpClient, LaunchOptions};
use crate::element::CdpElement;
use async_trait::async_trait;
use snapgrab_engine::config::BrowserConfig;
use snapgrab_engine::session::{BrowserSession, ElementHandle, SessionError};
use tracing::info;

/// A browser session driving local Chromium over the DevTools protocol.
pub struct HeadlessSession {
    client: Option<CdpClient>,
    options: LaunchOptions,
}

impl HeadlessSession {
    pub fn new() -> Self {
        Self {
            client: None,
            options: LaunchOptions::default(),
        }
    }

    pub fn with_options(options: LaunchOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }
}

impl Default for HeadlessSession {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&BrowserConfig> for HeadlessSession {
    fn from(config: &BrowserConfig) -> Self {
        Self::with_options(LaunchOptions {
            visible: config.visible,
            stealth: config.stealth,
            user_agent: config.stealth.then(|| config.user_agent.clone()),
        })
    }
}

#[async_trait]
impl BrowserSession for HeadlessSession {
    async fn launch(&mut self) -> Result<(), SessionError> {
        info!("Launching headless session (Chromium)...");
        let client = CdpClient::launch(&self.options)
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
            .page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn find_all(
        &mut self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, SessionError> {
        let client = self.client.as_ref().ok_or(SessionError::NotReady)?;
        let elements = client
            .page
            .find_elements(selector)
            .await
            .map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;

        Ok(elements
            .into_iter()
            .map(|e| Box::new(CdpElement::new(e)) as Box<dyn ElementHandle>)
            .collect())
    }
}
