use crate::parsers::{Extractor, resolve_url};
use crate::results::RawCandidate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches `![alt](url "title")`, an optional link wrapper close `](href)`,
/// and an optional adjacent `[caption]`.
static IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?:\s+"[^"]*")?\)(?:\]\([^)\s]*\))?(?:[ \t]*\[(?P<caption>[^\]\n]+)\])?"#,
    )
    .expect("image pattern is valid")
});

/// Pattern extractor for Markdown renderings of a results page
///
/// Declared dimensions are not part of Markdown, so they are recovered from
/// the `w`/`width` and `h`/`height` query parameters of the image URL. A
/// match without both is skipped.
#[derive(Debug, Clone, Default)]
pub struct MarkdownExtractor {
    base_url: Option<Url>,
}

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative image URLs against the page URL
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

impl Extractor for MarkdownExtractor {
    fn extract(&self, content: &str) -> Vec<RawCandidate> {
        let mut candidates = Vec::new();

        for caps in IMAGE_PATTERN.captures_iter(content) {
            let Some(raw_url) = caps.name("url") else {
                continue;
            };

            let unescaped = raw_url.as_str().replace("&amp;", "&");
            let Some(url) = resolve_url(&unescaped, self.base_url.as_ref()) else {
                ::log::trace!("Skipping unparsable image URL: {}", raw_url.as_str());
                continue;
            };

            let Some((width, height)) = query_dimensions(&url) else {
                ::log::trace!("Skipping image without size parameters: {}", url);
                continue;
            };

            let title = caps
                .name("caption")
                .map(|m| m.as_str().trim())
                .filter(|c| !c.is_empty())
                .or_else(|| caps.name("alt").map(|m| m.as_str().trim()))
                .unwrap_or_default();

            candidates.push(RawCandidate::new(url, title, width, height));
        }

        ::log::debug!("Markdown extractor matched {} images", candidates.len());
        candidates
    }
}

/// Reads `w`/`width` and `h`/`height` from the query string
///
/// Both must be present and positive.
pub fn query_dimensions(url: &Url) -> Option<(u32, u32)> {
    let mut width = None;
    let mut height = None;

    for (key, value) in url.query_pairs() {
        let parsed = value.trim().parse::<u32>().ok().filter(|v| *v > 0);
        match key.as_ref() {
            "w" | "width" if width.is_none() => width = parsed,
            "h" | "height" if height.is_none() => height = parsed,
            _ => {}
        }
    }

    Some((width?, height?))
}
