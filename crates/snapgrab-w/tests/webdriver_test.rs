//! WebDriver session integration tests
//!
//! These need a running chromedriver (`chromedriver --port=4444`).

use serial_test::serial;
use snapgrab_engine::session::{BrowserSession, ElementHandle};
use snapgrab_w::WebDriverSession;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[tokio::test]
#[serial]
#[ignore] // Requires chromedriver on localhost:4444
async fn test_webdriver_element_queries() {
    init_tracing();
    let mut session = WebDriverSession::new();
    session.launch().await.expect("Failed to connect to WebDriver");

    let html = "<div class='gallery'><img id='a' src='https://cdn.test/a.jpg' style='width:320px;height:320px'></div>";
    session
        .navigate(&format!("data:text/html,{}", html))
        .await
        .expect("Navigation failed");

    let images = session.find_all("img").await.expect("Query failed");
    assert_eq!(images.len(), 1);
    let img = &images[0];
    assert_eq!(
        img.attribute("src").await.unwrap().as_deref(),
        Some("https://cdn.test/a.jpg")
    );
    assert!(img.is_visible().await.unwrap());
    let (w, h) = img.bounding_size().await.unwrap();
    assert_eq!((w, h), (320.0, 320.0));

    let parent = img.parent().await.unwrap().expect("img has a parent");
    assert_eq!(parent.classes().await.unwrap(), vec!["gallery".to_string()]);

    session.close().await.expect("Failed to close");
}
