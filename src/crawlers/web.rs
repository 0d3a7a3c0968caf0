use crate::config::PageConfig;
use crate::crawlers::crawler::PageFetcher;
use crate::results::PageContent;
use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

/// Delay between scroll passes, giving lazy-loaded results time to appear
const SCROLL_PAUSE: Duration = Duration::from_millis(1000);

/// Loads pages in a real browser over the WebDriver protocol
#[derive(Debug, Clone)]
pub struct WebDriverFetcher {
    config: PageConfig,
}

impl WebDriverFetcher {
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    /// Capabilities for a headless Chrome or Firefox session
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        let window_size = format!(
            "--window-size={},{}",
            self.config.viewport_width, self.config.viewport_height
        );
        let user_agent = format!("--user-agent={}", self.config.user_agent);

        let mut chrome_args = vec![window_size, user_agent];
        let mut firefox_args = Vec::new();
        if self.config.headless {
            chrome_args.push("--headless=new".to_string());
            firefox_args.push("-headless".to_string());
        }

        caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
        caps.insert("moz:firefoxOptions".to_string(), json!({ "args": firefox_args }));
        caps
    }

    /// Navigate, let the page render, scroll, and read the source
    async fn load(&self, client: &Client, url: &str) -> Option<String> {
        if let Err(e) = client
            .set_window_size(self.config.viewport_width, self.config.viewport_height)
            .await
        {
            ::log::debug!("Could not resize browser window: {}", e);
        }

        if let Err(e) = client.goto(url).await {
            return handle_navigation_error(e, "accessing", url);
        }

        tokio::time::sleep(Duration::from_millis(self.config.render_wait_ms)).await;

        for round in 0..self.config.scroll_rounds {
            if let Err(e) = client
                .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
                .await
            {
                ::log::debug!("Scroll pass {} failed on {}: {}", round + 1, url, e);
                break;
            }
            tokio::time::sleep(SCROLL_PAUSE).await;
        }

        match client.source().await {
            Ok(source) => Some(source),
            Err(e) => handle_navigation_error(e, "getting source for", url),
        }
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> PageContent {
        let start = std::time::Instant::now();
        ::log::debug!("FETCH: {}", url);

        let Some(client) = connect_to_webdriver(&self.config.webdriver_url, self.capabilities()).await
        else {
            return PageContent::failed(url);
        };

        let page_timeout = Duration::from_secs(self.config.page_timeout_secs);
        let source = match timeout(page_timeout, self.load(&client, url)).await {
            Ok(source) => source,
            Err(_) => {
                ::log::error!("Timeout loading: {}", url);
                None
            }
        };

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }

        match source {
            Some(html) => {
                ::log::debug!(
                    "Loaded {} ({} bytes) in {:.2} seconds",
                    url,
                    html.len(),
                    start.elapsed().as_secs_f64()
                );
                PageContent::loaded(url, html)
            }
            None => PageContent::failed(url),
        }
    }

    fn name(&self) -> &str {
        "webdriver"
    }
}

/// Connects to the WebDriver instance, trying common local ports on failure
async fn connect_to_webdriver(webdriver_url: &str, caps: Capabilities) -> Option<Client> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps);

    match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // geckodriver / Selenium default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!("Failed to connect to any WebDriver servers");
    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Handles errors that occur during navigation or page source retrieval
fn handle_navigation_error(
    error: fantoccini::error::CmdError,
    context: &str,
    url: &str,
) -> Option<String> {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost session while {} {}", context, url);
    } else {
        ::log::error!("Failed to {} {}: {}", context, url, error);
    }
    None
}
