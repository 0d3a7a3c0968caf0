use serde::{Deserialize, Serialize};
use url::Url;

/// An image reference discovered on a page, before any filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Absolute image URL (may carry thumbnail query parameters)
    pub url: Url,

    /// Caption or alt text, possibly empty
    pub title: String,

    /// Width declared by the page markup or URL parameters (0 when absent)
    pub declared_width: u32,

    /// Height declared by the page markup or URL parameters (0 when absent)
    pub declared_height: u32,
}

impl RawCandidate {
    /// Create a new raw candidate
    pub fn new(url: Url, title: impl Into<String>, declared_width: u32, declared_height: u32) -> Self {
        Self {
            url,
            title: title.into(),
            declared_width,
            declared_height,
        }
    }

    /// Whether both declared dimensions are known
    pub fn has_declared_size(&self) -> bool {
        self.declared_width > 0 && self.declared_height > 0
    }
}

/// Outcome of the aspect-ratio check on declared dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectCheck {
    /// Declared width strictly exceeds declared height
    Landscape,
    /// Declared dimensions were missing; resolved after fetching the image
    Undecided,
}

/// A candidate that survived the keyword, aspect-ratio and dedup checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredCandidate {
    /// The candidate as extracted
    pub candidate: RawCandidate,

    /// Deduplication key: the URL without query string or fragment
    pub normalized_url: String,

    /// Result of the declared-dimension aspect check
    pub aspect: AspectCheck,
}

impl FilteredCandidate {
    pub fn url(&self) -> &Url {
        &self.candidate.url
    }

    pub fn title(&self) -> &str {
        &self.candidate.title
    }
}

/// A candidate whose true dimensions were measured and which was classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedResult {
    /// URL of the image
    pub url: String,

    /// Caption carried over from extraction
    pub title: String,

    /// Width measured from the fetched bytes
    pub true_width: u32,

    /// Height measured from the fetched bytes
    pub true_height: u32,

    /// Classification verdict
    pub matched: bool,
}

impl VerifiedResult {
    /// Whether this result belongs in the final output
    pub fn is_accepted(&self) -> bool {
        self.matched && self.true_width > self.true_height
    }
}

/// A search results page as returned by a page fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// URL of the page
    pub url: String,

    /// Whether the fetcher managed to load the page
    pub success: bool,

    /// Raw markup or Markdown rendering
    pub content: String,
}

impl PageContent {
    /// A successfully loaded page
    pub fn loaded(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: true,
            content: content.into(),
        }
    }

    /// A page that could not be loaded
    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            content: String::new(),
        }
    }
}
