use crate::error::Error;
use crate::filter::FilterConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Search page used when no URL is given
pub const DEFAULT_START_URL: &str =
    "https://image.baidu.com/search/index?tn=baiduimage&word=%E9%9F%A9%E7%AB%8B";

/// How the page content should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Raw markup, parsed with CSS selectors
    #[default]
    Html,
    /// Markdown rendering produced by a page-render service
    Markdown,
}

/// Which collaborator loads the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Browser driven over the WebDriver protocol
    #[default]
    WebDriver,
    /// Plain HTTP GET, optionally through a render service
    Http,
}

/// Configuration for loading the search page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub fetcher: FetcherKind,

    #[serde(default)]
    pub render_mode: RenderMode,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Time to let scripts render after navigation, in milliseconds
    #[serde(default = "default_render_wait_ms")]
    pub render_wait_ms: u64,

    /// Number of scroll-to-bottom passes to trigger lazy loading
    #[serde(default = "default_scroll_rounds")]
    pub scroll_rounds: u32,

    /// Upper bound for loading the page, in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Prefix prepended to the page URL for HTTP fetches (e.g. a reader service)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_service: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Where to find images in HTML pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Selector for the element wrapping each result
    #[serde(default = "default_container_selector")]
    pub container_selector: String,

    /// Selector for the image inside a container
    #[serde(default = "default_image_selector")]
    pub image_selector: String,

    /// Attributes holding the image URL, tried in order
    #[serde(default = "default_url_attributes")]
    pub url_attributes: Vec<String>,

    /// Rewrite applied to the URL to move from a thumbnail to the full image
    #[serde(default = "default_thumbnail_rewrite")]
    pub thumbnail_rewrite: Option<ThumbnailRewrite>,
}

/// Replace `from` with `to` in an extracted URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRewrite {
    pub from: String,
    pub to: String,
}

/// Settings for the content-classification model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model_name")]
    pub model: String,

    /// Subject the images are checked for
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Instruction template; `{subject}` and `{url}` are substituted
    #[serde(default = "default_instruction")]
    pub instruction: String,

    /// Token whose presence in the response means "matched"
    #[serde(default = "default_affirmative_token")]
    pub affirmative_token: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,

    /// Attach the fetched image bytes (for multimodal models)
    #[serde(default)]
    pub send_image: bool,

    /// Ignore `<think>` blocks emitted by reasoning models (off: the whole
    /// response is searched for the affirmative token)
    #[serde(default)]
    pub strip_reasoning: bool,
}

/// Configuration for the per-image verification stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,

    /// Timeout for one image download, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Largest image body accepted, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Maximum number of images checked at once (None = all at once)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: Option<usize>,

    /// Minimum true width/height ratio, on top of width > height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_aspect_ratio: Option<f64>,

    /// Model used to judge image content (None = accept every landscape image)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

/// Configuration for a complete pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Search results page to scan
    #[serde(default = "default_start_url")]
    pub start_url: String,

    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<(), Error> {
        if self.start_url.trim().is_empty() {
            return Err(Error::Config("start_url must not be empty".to_string()));
        }
        if self.extract.url_attributes.is_empty() {
            return Err(Error::Config(
                "extract.url_attributes needs at least one attribute".to_string(),
            ));
        }
        if self.classifier.max_concurrency == Some(0) {
            return Err(Error::Config(
                "classifier.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.classifier.max_image_bytes == 0 {
            return Err(Error::Config(
                "classifier.max_image_bytes must be at least 1".to_string(),
            ));
        }
        if let Some(model) = &self.classifier.model {
            if model.affirmative_token.is_empty() {
                return Err(Error::Config(
                    "classifier.model.affirmative_token must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            page: PageConfig::default(),
            extract: ExtractConfig::default(),
            filter: FilterConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherKind::default(),
            render_mode: RenderMode::default(),
            webdriver_url: default_webdriver_url(),
            headless: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            render_wait_ms: default_render_wait_ms(),
            scroll_rounds: default_scroll_rounds(),
            page_timeout_secs: default_page_timeout_secs(),
            render_service: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_selector: default_container_selector(),
            image_selector: default_image_selector(),
            url_attributes: default_url_attributes(),
            thumbnail_rewrite: default_thumbnail_rewrite(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_model_endpoint(),
            model: default_model_name(),
            subject: default_subject(),
            instruction: default_instruction(),
            affirmative_token: default_affirmative_token(),
            temperature: default_temperature(),
            timeout_secs: default_model_timeout_secs(),
            send_image: false,
            strip_reasoning: false,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referer: Some("https://image.baidu.com/".to_string()),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            max_concurrency: default_max_concurrency(),
            min_aspect_ratio: None,
            model: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_start_url() -> String {
    DEFAULT_START_URL.to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_render_wait_ms() -> u64 {
    3000
}

fn default_scroll_rounds() -> u32 {
    5
}

fn default_page_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_container_selector() -> String {
    ".imgbox".to_string()
}

fn default_image_selector() -> String {
    "img".to_string()
}

fn default_url_attributes() -> Vec<String> {
    vec![
        "data-src".to_string(),
        "data-imgurl".to_string(),
        "src".to_string(),
    ]
}

fn default_thumbnail_rewrite() -> Option<ThumbnailRewrite> {
    Some(ThumbnailRewrite {
        from: "thumbnail".to_string(),
        to: "large".to_string(),
    })
}

fn default_model_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model_name() -> String {
    "deepseek-r1:8b".to_string()
}

fn default_subject() -> String {
    "韩立".to_string()
}

fn default_instruction() -> String {
    "判断图片是否包含修仙小说角色'{subject}'，只需回答是或否。图片URL：{url}".to_string()
}

fn default_affirmative_token() -> String {
    "是".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}

/// Default value for max_concurrency
fn default_max_concurrency() -> Option<usize> {
    Some(5)
}
