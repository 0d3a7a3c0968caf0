pub mod html;
pub mod markdown;

#[cfg(test)]
mod tests;

use crate::config::{ExtractConfig, RenderMode};
use crate::results::RawCandidate;
use url::Url;

/// Turns one page representation into image candidates
///
/// Implementations never fail: malformed nodes or matches are skipped and
/// the output keeps document order.
pub trait Extractor {
    fn extract(&self, content: &str) -> Vec<RawCandidate>;
}

/// Enum to represent the supported page representations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorType {
    /// Raw HTML markup
    Html,
    /// Markdown rendering of the page
    Markdown,
}

impl ExtractorType {
    /// Picks the extractor for a configured render mode
    pub fn from_render_mode(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Html => ExtractorType::Html,
            RenderMode::Markdown => ExtractorType::Markdown,
        }
    }

    /// Guesses the representation from the content itself
    pub fn detect(content: &str) -> Self {
        let trimmed = content.trim_start();
        if trimmed.starts_with('<') {
            ::log::debug!("Classifying content as HTML");
            ExtractorType::Html
        } else {
            ::log::debug!("Classifying content as Markdown");
            ExtractorType::Markdown
        }
    }
}

/// Main parser that delegates to the strategy for each representation
pub struct Parser;

impl Parser {
    /// Extract candidates using default options for the given type
    pub fn extract(content: &str, extractor_type: ExtractorType) -> Vec<RawCandidate> {
        Self::extract_with_config(content, extractor_type, &ExtractConfig::default(), None)
    }

    /// Extract candidates with explicit HTML options and base URL
    pub fn extract_with_config(
        content: &str,
        extractor_type: ExtractorType,
        config: &ExtractConfig,
        base_url: Option<&Url>,
    ) -> Vec<RawCandidate> {
        let candidates = match extractor_type {
            ExtractorType::Html => {
                let mut extractor = html::HtmlExtractor::from_config(config);
                if let Some(base) = base_url {
                    extractor = extractor.with_base_url(base.clone());
                }
                extractor.extract(content)
            }
            ExtractorType::Markdown => {
                let extractor = markdown::MarkdownExtractor::new();
                match base_url {
                    Some(base) => extractor.with_base_url(base.clone()).extract(content),
                    None => extractor.extract(content),
                }
            }
        };

        ::log::info!(
            "{:?} extractor found {} candidates",
            extractor_type,
            candidates.len()
        );
        candidates
    }

    /// Detect the representation and then extract
    pub fn extract_detected(content: &str) -> Vec<RawCandidate> {
        Self::extract(content, ExtractorType::detect(content))
    }
}

/// Resolve a possibly relative image reference to an absolute URL
pub(crate) fn resolve_url(raw: &str, base_url: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => base_url?.join(raw).ok(),
        Err(_) => None,
    }
}
