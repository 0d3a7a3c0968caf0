use crate::config::PageConfig;
use crate::crawlers::crawler::PageFetcher;
use crate::error::Error;
use crate::results::PageContent;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Loads pages with a plain HTTP GET
///
/// With a render service configured, the page URL is appended to the
/// service prefix and whatever the service returns (typically Markdown)
/// becomes the page content.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    render_service: Option<String>,
}

impl HttpFetcher {
    pub fn new(config: &PageConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            render_service: config.render_service.clone(),
        })
    }

    /// The URL actually requested for a page
    pub fn request_url(&self, url: &str) -> String {
        match &self.render_service {
            Some(prefix) => format!("{}{}", prefix, url),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> PageContent {
        let request_url = self.request_url(url);
        ::log::debug!("FETCH: {}", request_url);

        let response = match self.client.get(&request_url).send().await {
            Ok(response) => response,
            Err(e) => {
                ::log::error!("Failed to fetch {}: {}", request_url, e);
                return PageContent::failed(url);
            }
        };

        let status = response.status();
        if !status.is_success() {
            ::log::error!("Fetching {} returned status {}", request_url, status);
            return PageContent::failed(url);
        }

        match response.text().await {
            Ok(body) => PageContent::loaded(url, body),
            Err(e) => {
                ::log::error!("Failed to read body of {}: {}", request_url, e);
                PageContent::failed(url)
            }
        }
    }

    fn name(&self) -> &str {
        if self.render_service.is_some() {
            "render-service"
        } else {
            "http"
        }
    }
}
