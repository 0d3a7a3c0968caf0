use crate::config::{ExtractConfig, ThumbnailRewrite};
use crate::parsers::{Extractor, resolve_url};
use crate::results::RawCandidate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Structural extractor: finds result containers with CSS selectors
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    container_selector: String,
    image_selector: String,
    url_attributes: Vec<String>,
    thumbnail_rewrite: Option<ThumbnailRewrite>,
    base_url: Option<Url>,
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractConfig::default())
    }
}

impl HtmlExtractor {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            container_selector: config.container_selector.clone(),
            image_selector: config.image_selector.clone(),
            url_attributes: config.url_attributes.clone(),
            thumbnail_rewrite: config.thumbnail_rewrite.clone(),
            base_url: None,
        }
    }

    /// Resolve relative image URLs against the page URL
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Reads one container; None when it has no usable image
    fn read_container(&self, container: ElementRef, image_selector: &Selector) -> Option<RawCandidate> {
        let img = container.select(image_selector).next()?;
        let element = img.value();

        let raw_url = self
            .url_attributes
            .iter()
            .find_map(|name| element.attr(name).filter(|v| !v.trim().is_empty()))?;

        let rewritten = match &self.thumbnail_rewrite {
            Some(rule) if !rule.from.is_empty() => raw_url.replace(&rule.from, &rule.to),
            _ => raw_url.to_string(),
        };
        let url = resolve_url(&rewritten, self.base_url.as_ref())?;

        let width = parse_dimension(element.attr("width"))?;
        let height = parse_dimension(element.attr("height"))?;
        let title = element.attr("alt").unwrap_or_default().trim();

        Some(RawCandidate::new(url, title, width, height))
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, content: &str) -> Vec<RawCandidate> {
        let (container_selector, image_selector) = match (
            Selector::parse(&self.container_selector),
            Selector::parse(&self.image_selector),
        ) {
            (Ok(c), Ok(i)) => (c, i),
            _ => {
                ::log::warn!(
                    "Invalid selector ({:?} / {:?}), no candidates extracted",
                    self.container_selector,
                    self.image_selector
                );
                return Vec::new();
            }
        };

        let doc = Html::parse_document(content);
        let mut skipped = 0;
        let candidates: Vec<RawCandidate> = doc
            .select(&container_selector)
            .filter_map(|container| {
                let candidate = self.read_container(container, &image_selector);
                if candidate.is_none() {
                    skipped += 1;
                }
                candidate
            })
            .collect();

        ::log::debug!(
            "HTML extractor read {} containers, skipped {}",
            candidates.len() + skipped,
            skipped
        );
        candidates
    }
}

/// Missing attribute means unknown (0); a present but non-numeric value is unusable
fn parse_dimension(value: Option<&str>) -> Option<u32> {
    match value.map(str::trim) {
        None | Some("") => Some(0),
        Some(v) => v.trim_end_matches("px").parse().ok(),
    }
}
