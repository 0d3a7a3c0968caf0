// Re-export modules
pub mod classifier;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use error::Error;
pub use pipeline::Pipeline;
pub use results::{FilteredCandidate, PageContent, RawCandidate, VerifiedResult};

use config::{ModelConfig, PipelineConfig, RenderMode};
use crawlers::PageFetcher;

/// Main builder for finding images on a search results page
pub struct Images {
    config: PipelineConfig,
    fetcher: Option<Box<dyn PageFetcher>>,
}

impl Images {
    /// Create a new Images builder for the given page URL
    pub fn new(url: &str) -> Self {
        Self {
            config: PipelineConfig::new(url),
            fetcher: None,
        }
    }

    /// Replace the configuration, keeping the page URL given to `new`
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        let start_url = std::mem::take(&mut self.config.start_url);
        self.config = config;
        self.config.start_url = start_url;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let config = PipelineConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, Error> {
        let config = PipelineConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Only keep images whose title contains this keyword
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.filter.keyword = Some(keyword.into());
        self
    }

    /// Keep at most `limit` candidates
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.config.filter.limit = Some(limit);
        self
    }

    /// Ask the classification model whether each image shows `subject`
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let model = self
            .config
            .classifier
            .model
            .get_or_insert_with(ModelConfig::default);
        model.subject = subject.into();
        self
    }

    /// Interpret the page as HTML or Markdown
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.config.page.render_mode = mode;
        self
    }

    /// Set the maximum number of images checked at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.classifier.max_concurrency = Some(max_concurrency);
        self
    }

    /// Use a custom page fetcher instead of the configured one
    pub fn with_fetcher(mut self, fetcher: Box<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the page and return the verified images
    ///
    /// Only setup problems are errors; a page that fails to load yields an
    /// empty list.
    pub async fn generate(self) -> Result<Vec<VerifiedResult>, Error> {
        let (pipeline, page) = self.prepare().await?;
        Ok(pipeline.run(&page).await)
    }

    /// Load the page and return the filtered candidates without fetching images
    pub async fn generate_candidates(self) -> Result<Vec<FilteredCandidate>, Error> {
        let (pipeline, page) = self.prepare().await?;
        Ok(pipeline.candidates(&page))
    }

    async fn prepare(mut self) -> Result<(Pipeline, PageContent), Error> {
        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.config.page.webdriver_url = webdriver_url;
            }
        }

        self.config.validate()?;
        url::Url::parse(&self.config.start_url)?;

        let pipeline = Pipeline::from_config(&self.config)?;
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => crawlers::from_config(&self.config.page)?,
        };

        ::log::info!(
            "Fetching {} with the {} fetcher",
            self.config.start_url,
            fetcher.name()
        );
        let page = fetcher.fetch(&self.config.start_url).await;
        Ok((pipeline, page))
    }
}
