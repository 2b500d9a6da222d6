use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(
        url: &str,
        capabilities: Map<String, Value>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(url)
            .await
            .map_err(|e| format!("Failed to connect to WebDriver at {}: {}", url, e))?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.client
            .close()
            .await
            .map_err(|e| format!("Failed to close session: {}", e))?;
        Ok(())
    }
}

/// `goog:chromeOptions` for a headless, low-fingerprint Chrome.
pub fn chrome_capabilities(
    headless: bool,
    stealth: bool,
    user_agent: Option<&str>,
) -> Map<String, Value> {
    let mut args = vec!["--no-sandbox".to_string()];
    if headless {
        args.push("--headless=new".to_string());
    }
    if stealth {
        args.push("--disable-blink-features=AutomationControlled".to_string());
        args.push("--disable-extensions".to_string());
        args.push("--disable-dev-shm-usage".to_string());
    }
    if let Some(ua) = user_agent {
        args.push(format!("user-agent={}", ua));
    }

    let mut chrome = Map::new();
    chrome.insert("args".into(), json!(args));
    if stealth {
        chrome.insert("excludeSwitches".into(), json!(["enable-automation"]));
        chrome.insert("useAutomationExtension".into(), json!(false));
    }

    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("goog:chromeOptions".into(), Value::Object(chrome));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stealth_capabilities_hide_automation() {
        let caps = chrome_capabilities(true, true, Some("UA/1.0"));
        let chrome = &caps["goog:chromeOptions"];
        let args: Vec<&str> = chrome["args"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|a| a.as_str())
            .collect();
        assert!(args.contains(&"--headless=new"));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled"));
        assert!(args.contains(&"user-agent=UA/1.0"));
        assert_eq!(chrome["excludeSwitches"][0], "enable-automation");
        assert_eq!(chrome["useAutomationExtension"], false);
    }

    #[test]
    fn plain_capabilities() {
        let caps = chrome_capabilities(false, false, None);
        let chrome = &caps["goog:chromeOptions"];
        assert_eq!(chrome["args"], json!(["--no-sandbox"]));
        assert!(chrome.get("excludeSwitches").is_none());
    }
}
