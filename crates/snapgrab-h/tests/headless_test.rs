use async_trait::async_trait;
use serial_test::serial;
use snapgrab_engine::config::ScrapeConfig;
use snapgrab_engine::http::{FetchError, HttpFetcher, HttpResponse};
use snapgrab_engine::log::MemorySink;
use snapgrab_engine::scrape;
use snapgrab_engine::selection::{SelectionOptions, select_elements};
use snapgrab_engine::session::{BrowserSession, ElementHandle};
use snapgrab_h::HeadlessSession;
use std::time::Duration;

const GALLERY_PAGE: &str = "<html><body>\
    <div data-media-type='image'>\
      <img src='https://cdn.test/a_small.jpg' srcset='https://cdn.test/a_400.jpg 400w, https://cdn.test/a_1200.jpg 1200w'>\
      <img data-src='//cdn.test/b.png'>\
    </div>\
    <div class='thumbnail'><img src='https://cdn.test/t.jpg' style='width:400px;height:400px'></div>\
    <img src='https://cdn.test/big.jpg' style='width:400px;height:400px'>\
    <img src='https://cdn.test/icon.jpg' style='width:40px;height:40px'>\
    </body></html>";

struct EchoFetcher;

#[async_trait]
impl HttpFetcher for EchoFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 200,
            body: url.as_bytes().to_vec(),
        })
    }
}

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", html)
}

fn quick_config() -> ScrapeConfig {
    ScrapeConfig {
        wait_timeout_ms: 1000,
        settle_delay_min_ms: 0,
        settle_delay_max_ms: 0,
        ..ScrapeConfig::default()
    }
}

async fn launched() -> Option<HeadlessSession> {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let mut session = HeadlessSession::new();
    match session.launch().await {
        Ok(()) => Some(session),
        Err(e) => {
            eprintln!("Skipping test: Chromium not available: {}", e);
            None
        }
    }
}

#[tokio::test]
#[serial]
async fn test_scrape_gallery_page() {
    // Probe first; scrape() launches its own session.
    let Some(mut probe) = launched().await else {
        return;
    };
    probe.close().await.expect("Failed to close probe");

    let dir = tempfile::tempdir().unwrap();
    let mut session = HeadlessSession::new();
    let summary = scrape(
        &mut session,
        &EchoFetcher,
        &data_url(GALLERY_PAGE),
        "div[data-media-type='image'] img",
        dir.path(),
        &quick_config(),
        &MemorySink::new(),
    )
    .await
    .expect("scrape failed");

    assert_eq!(summary.saved, 2);
    assert!(!summary.used_fallback);
    assert_eq!(
        std::fs::read(dir.path().join("image_1.jpg")).unwrap(),
        b"https://cdn.test/a_1200.jpg"
    );
    assert_eq!(
        std::fs::read(dir.path().join("image_2.png")).unwrap(),
        b"https://cdn.test/b.png"
    );
    assert!(!session.is_ready().await);
}

#[tokio::test]
#[serial]
async fn test_fallback_heuristic_in_real_dom() {
    let Some(mut session) = launched().await else {
        return;
    };

    let mut config = quick_config();
    config.wait_timeout_ms = 300;
    config.fallback.min_width = 300;
    config.fallback.min_height = 300;
    let result = select_elements(
        &mut session,
        &data_url(GALLERY_PAGE),
        ".does-not-exist",
        &SelectionOptions::from(&config),
        &MemorySink::new(),
    )
    .await
    .expect("selection failed");

    assert!(result.used_fallback);
    assert_eq!(result.len(), 1);
    let src = result.elements[0].attribute("src").await.unwrap();
    assert_eq!(src.as_deref(), Some("https://cdn.test/big.jpg"));

    drop(result);
    session.close().await.expect("Failed to close");
}
