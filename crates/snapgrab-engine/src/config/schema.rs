use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_settle_delay_min_ms")]
    pub settle_delay_min_ms: u64,
    #[serde(default = "default_settle_delay_max_ms")]
    pub settle_delay_max_ms: u64,
    #[serde(default = "default_placeholder_tokens")]
    pub placeholder_tokens: Vec<String>,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            selector: default_selector(),
            wait_timeout_ms: default_wait_timeout_ms(),
            settle_delay_min_ms: default_settle_delay_min_ms(),
            settle_delay_max_ms: default_settle_delay_max_ms(),
            placeholder_tokens: default_placeholder_tokens(),
            fallback: FallbackConfig::default(),
            download: DownloadConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_selector() -> String {
    "div[data-media-type='image'] img".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    10000
}

fn default_settle_delay_min_ms() -> u64 {
    2000
}

fn default_settle_delay_max_ms() -> u64 {
    4000
}

fn default_placeholder_tokens() -> Vec<String> {
    ["{width}", "{height}", "%7Bwidth%7D", "%7Bheight%7D"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Heuristic used when the explicit selector matches nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_image_tag")]
    pub image_tag: String,
    #[serde(default = "default_min_size")]
    pub min_width: u32,
    #[serde(default = "default_min_size")]
    pub min_height: u32,
    #[serde(default = "default_decoy_keywords")]
    pub decoy_keywords: Vec<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            image_tag: default_image_tag(),
            min_width: default_min_size(),
            min_height: default_min_size(),
            decoy_keywords: default_decoy_keywords(),
        }
    }
}

fn default_image_tag() -> String {
    "img".to_string()
}

fn default_min_size() -> u32 {
    300
}

fn default_decoy_keywords() -> Vec<String> {
    vec![
        "thumbnail".to_string(),
        "product-gallery__thumbnail".to_string(),
        "scroll-area".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_download_timeout_ms(),
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_download_timeout_ms() -> u64 {
    30000
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_stealth")]
    pub stealth: bool,
    #[serde(default)]
    pub visible: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            stealth: default_stealth(),
            visible: false,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36"
        .to_string()
}

fn default_stealth() -> bool {
    true
}
