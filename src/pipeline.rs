use crate::classifier::Classifier;
use crate::config::{ExtractConfig, PipelineConfig};
use crate::error::Error;
use crate::filter::CandidateFilter;
use crate::parsers::{ExtractorType, Parser};
use crate::results::{FilteredCandidate, PageContent, VerifiedResult};
use url::Url;

/// Extract → filter → classify over one loaded page
///
/// All collaborators are passed in; the pipeline holds no other state and
/// can be reused across pages.
pub struct Pipeline {
    extractor_type: Option<ExtractorType>,
    extract: ExtractConfig,
    filter: CandidateFilter,
    classifier: Classifier,
}

impl Pipeline {
    /// Create a pipeline that detects the page representation from its content
    pub fn new(filter: CandidateFilter, classifier: Classifier) -> Self {
        Self {
            extractor_type: None,
            extract: ExtractConfig::default(),
            filter,
            classifier,
        }
    }

    /// Build every stage from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, Error> {
        let filter = CandidateFilter::new(config.filter.clone())?;
        let classifier = Classifier::from_config(&config.classifier)?;

        Ok(Self::new(filter, classifier)
            .with_extractor_type(ExtractorType::from_render_mode(config.page.render_mode))
            .with_extract_config(config.extract.clone()))
    }

    /// Always use this extraction strategy
    pub fn with_extractor_type(mut self, extractor_type: ExtractorType) -> Self {
        self.extractor_type = Some(extractor_type);
        self
    }

    /// Set the selectors used by the HTML strategy
    pub fn with_extract_config(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    /// Extraction and filtering only; no image is fetched
    pub fn candidates(&self, page: &PageContent) -> Vec<FilteredCandidate> {
        if !page.success {
            ::log::error!("Page could not be loaded, no candidates: {}", page.url);
            return Vec::new();
        }

        let extractor_type = self
            .extractor_type
            .unwrap_or_else(|| ExtractorType::detect(&page.content));
        let base_url = Url::parse(&page.url).ok();

        let raw = Parser::extract_with_config(
            &page.content,
            extractor_type,
            &self.extract,
            base_url.as_ref(),
        );
        self.filter.apply(raw)
    }

    /// Full run: the verified results in filter order
    pub async fn run(&self, page: &PageContent) -> Vec<VerifiedResult> {
        let candidates = self.candidates(page);
        if candidates.is_empty() {
            return Vec::new();
        }

        ::log::info!("Verifying {} candidates from {}", candidates.len(), page.url);
        self.classifier.verify_all(&candidates).await
    }
}
