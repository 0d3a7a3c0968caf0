pub mod crawler;
pub mod http;
pub mod web;

pub use crawler::PageFetcher;
pub use http::HttpFetcher;
pub use web::WebDriverFetcher;

use crate::config::{FetcherKind, PageConfig};
use crate::error::Error;

/// Create the page fetcher selected by the configuration
pub fn from_config(config: &PageConfig) -> Result<Box<dyn PageFetcher>, Error> {
    match config.fetcher {
        FetcherKind::WebDriver => Ok(Box::new(WebDriverFetcher::new(config.clone()))),
        FetcherKind::Http => Ok(Box::new(HttpFetcher::new(config)?)),
    }
}
