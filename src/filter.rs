use crate::results::{AspectCheck, FilteredCandidate, RawCandidate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Configuration for candidate filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Substring the title must contain (case-sensitive); None keeps every title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Regex patterns for image URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for image URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Drop candidates whose declared size is not landscape
    #[serde(default = "default_require_landscape")]
    pub require_landscape: bool,

    /// Keep at most this many candidates (None = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Default value for require_landscape
fn default_require_landscape() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keyword: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            require_landscape: default_require_landscape(),
            limit: None,
        }
    }
}

impl FilterConfig {
    /// Filter on a title keyword with the remaining settings at their defaults
    pub fn with_keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }
}

/// Reduces extracted candidates to a deduplicated, capped list
///
/// Checks run in a fixed order: url patterns, keyword, declared aspect
/// ratio, dedup by normalized URL, and finally truncation to the limit.
#[derive(Debug)]
pub struct CandidateFilter {
    config: FilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            config: FilterConfig::default(),
            include_regexes: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl CandidateFilter {
    /// Create a new candidate filter from configuration
    pub fn new(config: FilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every check over the candidates, preserving document order
    pub fn apply(&self, candidates: Vec<RawCandidate>) -> Vec<FilteredCandidate> {
        let total = candidates.len();
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for candidate in candidates {
            if !self.matches_url_patterns(&candidate.url) {
                ::log::debug!("URL pattern rejected: {}", candidate.url);
                continue;
            }

            if !self.matches_keyword(&candidate.title) {
                ::log::debug!("Keyword rejected: {} ({:?})", candidate.url, candidate.title);
                continue;
            }

            let aspect = match self.check_aspect(&candidate) {
                Some(aspect) => aspect,
                None => {
                    ::log::debug!(
                        "Declared size rejected: {} ({}x{})",
                        candidate.url,
                        candidate.declared_width,
                        candidate.declared_height
                    );
                    continue;
                }
            };

            let normalized_url = normalize_url(&candidate.url);
            if !seen.insert(normalized_url.clone()) {
                ::log::trace!("Skipping duplicate: {}", normalized_url);
                continue;
            }

            kept.push(FilteredCandidate {
                candidate,
                normalized_url,
                aspect,
            });
        }

        if let Some(limit) = self.config.limit {
            kept.truncate(limit);
        }

        ::log::info!("Filter kept {} of {} candidates", kept.len(), total);
        kept
    }

    /// Check the include/exclude regex patterns against a URL
    pub fn matches_url_patterns(&self, url: &Url) -> bool {
        let url_str = url.as_str();

        // Exclusions take precedence
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }

    /// Exact, case-sensitive substring match against the title
    pub fn matches_keyword(&self, title: &str) -> bool {
        match &self.config.keyword {
            Some(keyword) => title.contains(keyword.as_str()),
            None => true,
        }
    }

    /// Aspect check on declared dimensions; None means the candidate is rejected
    pub fn check_aspect(&self, candidate: &RawCandidate) -> Option<AspectCheck> {
        if !candidate.has_declared_size() {
            return Some(AspectCheck::Undecided);
        }

        if candidate.declared_width > candidate.declared_height {
            Some(AspectCheck::Landscape)
        } else if self.config.require_landscape {
            None
        } else {
            Some(AspectCheck::Undecided)
        }
    }
}

/// Create the deduplication key for an image URL (query and fragment removed)
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, title: &str, w: u32, h: u32) -> RawCandidate {
        RawCandidate::new(Url::parse(url).unwrap(), title, w, h)
    }

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        let url = Url::parse("https://img.example.com/a/b.jpg?w=500&h=300#top").unwrap();
        assert_eq!(normalize_url(&url), "https://img.example.com/a/b.jpg");

        let with_port = Url::parse("http://example.com:8080/x.png?v=1").unwrap();
        assert_eq!(normalize_url(&with_port), "http://example.com:8080/x.png");
    }

    #[test]
    fn test_keyword_filter() {
        let filter = CandidateFilter::new(FilterConfig::with_keyword("target")).unwrap();
        let kept = filter.apply(vec![
            candidate("https://example.com/1.jpg", "A-target", 400, 200),
            candidate("https://example.com/2.jpg", "other", 800, 200),
            candidate("https://example.com/3.jpg", "Target", 800, 200),
        ]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title(), "A-target");
    }

    #[test]
    fn test_declared_portrait_is_rejected() {
        let filter = CandidateFilter::default();
        let kept = filter.apply(vec![
            candidate("https://example.com/tall.jpg", "", 100, 300),
            candidate("https://example.com/square.jpg", "", 300, 300),
            candidate("https://example.com/wide.jpg", "", 300, 100),
        ]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url().path(), "/wide.jpg");
        assert_eq!(kept[0].aspect, AspectCheck::Landscape);
    }

    #[test]
    fn test_unknown_size_is_undecided() {
        let filter = CandidateFilter::default();
        let kept = filter.apply(vec![
            candidate("https://example.com/a.jpg", "", 0, 0),
            candidate("https://example.com/b.jpg", "", 500, 0),
        ]);

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|c| c.aspect == AspectCheck::Undecided));
    }

    #[test]
    fn test_landscape_not_required() {
        let config = FilterConfig {
            require_landscape: false,
            ..FilterConfig::default()
        };
        let filter = CandidateFilter::new(config).unwrap();
        let kept = filter.apply(vec![candidate("https://example.com/tall.jpg", "", 100, 300)]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].aspect, AspectCheck::Undecided);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let filter = CandidateFilter::default();
        let kept = filter.apply(vec![
            candidate("https://example.com/same.jpg?w=400&h=200", "first", 400, 200),
            candidate("https://example.com/other.jpg", "middle", 400, 200),
            candidate("https://example.com/same.jpg?w=800&h=400", "second", 800, 400),
        ]);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title(), "first");
        assert_eq!(kept[0].normalized_url, "https://example.com/same.jpg");
        assert_eq!(kept[1].title(), "middle");
    }

    #[test]
    fn test_truncation_after_dedup() {
        let config = FilterConfig {
            limit: Some(2),
            ..FilterConfig::with_keyword("x")
        };
        let filter = CandidateFilter::new(config).unwrap();
        let kept = filter.apply(vec![
            candidate("https://example.com/1.jpg", "x1", 400, 200),
            candidate("https://example.com/1.jpg?dup", "x1 again", 400, 200),
            candidate("https://example.com/2.jpg", "x2", 400, 200),
            candidate("https://example.com/3.jpg", "x3", 400, 200),
        ]);

        let titles: Vec<_> = kept.iter().map(|c| c.title()).collect();
        assert_eq!(titles, vec!["x1", "x2"]);
    }

    #[test]
    fn test_regex_patterns() {
        let config = FilterConfig {
            include_patterns: vec![r"\.(jpe?g|png)$".to_string()],
            exclude_patterns: vec![r"/ads/".to_string()],
            ..FilterConfig::default()
        };
        let filter = CandidateFilter::new(config).unwrap();

        let included = Url::parse("https://example.com/img/a.jpg").unwrap();
        assert!(filter.matches_url_patterns(&included));

        let not_included = Url::parse("https://example.com/img/a.gif").unwrap();
        assert!(!filter.matches_url_patterns(&not_included));

        let excluded = Url::parse("https://example.com/ads/a.jpg").unwrap();
        assert!(!filter.matches_url_patterns(&excluded));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let config = FilterConfig {
            include_patterns: vec!["(".to_string()],
            ..FilterConfig::default()
        };
        assert!(CandidateFilter::new(config).is_err());
    }
}
