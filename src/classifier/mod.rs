//! Per-image verification: fetch the bytes, measure the true size, and ask
//! the content classifier whether the image shows the subject.
//!
//! Every candidate is checked independently and concurrently. A failure
//! only ever drops the candidate it belongs to, and results are collected
//! positionally so they keep the filter order.

pub mod model;
pub mod source;

use crate::config::ClassifierConfig;
use crate::error::{CandidateRejection, Error};
use crate::results::{FilteredCandidate, VerifiedResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use model::{ClassificationRequest, ContentClassifier, Judge, OllamaClassifier};
pub use source::{HttpImageSource, ImageSource, decode_dimensions};

/// Verifies filtered candidates against their real image data
#[derive(Clone)]
pub struct Classifier {
    source: Arc<dyn ImageSource>,
    judge: Option<Judge>,
    max_concurrency: Option<usize>,
    min_aspect_ratio: Option<f64>,
}

impl Classifier {
    /// Classifier that accepts every image with a landscape true size
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self {
            source,
            judge: None,
            max_concurrency: None,
            min_aspect_ratio: None,
        }
    }

    /// Build the HTTP image source and, if configured, the model judge
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, Error> {
        let source = HttpImageSource::new(config)?;
        let mut classifier = Self::new(Arc::new(source))
            .with_max_concurrency(config.max_concurrency)
            .with_min_aspect_ratio(config.min_aspect_ratio);

        if let Some(model) = &config.model {
            classifier = classifier.with_judge(Judge::ollama(model)?);
        }
        Ok(classifier)
    }

    pub fn with_judge(mut self, judge: Judge) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Limit how many images are checked at the same time
    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency.filter(|n| *n > 0);
        self
    }

    /// Require width / height to reach this ratio in addition to width > height
    pub fn with_min_aspect_ratio(mut self, ratio: Option<f64>) -> Self {
        self.min_aspect_ratio = ratio;
        self
    }

    /// Check a single candidate
    pub async fn check(
        &self,
        candidate: &FilteredCandidate,
    ) -> Result<VerifiedResult, CandidateRejection> {
        let url = candidate.url();

        let bytes = self
            .source
            .fetch(url)
            .await
            .map_err(|source| CandidateRejection::Fetch {
                url: url.to_string(),
                source,
            })?;

        let (width, height) =
            decode_dimensions(&bytes).map_err(|reason| CandidateRejection::Decode {
                url: url.to_string(),
                reason,
            })?;

        // True dimensions override whatever the page declared
        if !self.is_wide_enough(width, height) {
            return Err(CandidateRejection::NotLandscape {
                url: url.to_string(),
                width,
                height,
            });
        }

        if let Some(judge) = &self.judge {
            let matched = judge.judge(url, &bytes).await.map_err(|source| {
                CandidateRejection::Classification {
                    url: url.to_string(),
                    source,
                }
            })?;
            if !matched {
                return Err(CandidateRejection::NotMatched {
                    url: url.to_string(),
                });
            }
        }

        Ok(VerifiedResult {
            url: url.to_string(),
            title: candidate.title().to_string(),
            true_width: width,
            true_height: height,
            matched: true,
        })
    }

    /// Check all candidates concurrently; outcome `i` belongs to candidate `i`
    pub async fn check_all(
        &self,
        candidates: &[FilteredCandidate],
    ) -> Vec<Result<VerifiedResult, CandidateRejection>> {
        let semaphore = self.max_concurrency.map(Semaphore::new);

        let checks = candidates.iter().map(|candidate| {
            let semaphore = semaphore.as_ref();
            async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire().await.ok(),
                    None => None,
                };
                self.check(candidate).await
            }
        });

        join_all(checks).await
    }

    /// Check all candidates and keep only the accepted ones, in input order
    pub async fn verify_all(&self, candidates: &[FilteredCandidate]) -> Vec<VerifiedResult> {
        let outcomes = self.check_all(candidates).await;
        let total = outcomes.len();

        let accepted: Vec<VerifiedResult> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(result) if result.is_accepted() => Some(result),
                Ok(result) => {
                    ::log::debug!("Dropping unaccepted result: {}", result.url);
                    None
                }
                Err(rejection) => {
                    log_rejection(&rejection);
                    None
                }
            })
            .collect();

        ::log::info!("Classifier accepted {} of {} candidates", accepted.len(), total);
        accepted
    }

    fn is_wide_enough(&self, width: u32, height: u32) -> bool {
        if width <= height {
            return false;
        }
        match self.min_aspect_ratio {
            Some(min) => f64::from(width) / f64::from(height) >= min,
            None => true,
        }
    }
}

fn log_rejection(rejection: &CandidateRejection) {
    match rejection {
        CandidateRejection::Fetch { .. }
        | CandidateRejection::Decode { .. }
        | CandidateRejection::Classification { .. } => {
            ::log::warn!("Failed to process image: {}", rejection)
        }
        CandidateRejection::NotLandscape { .. } | CandidateRejection::NotMatched { .. } => {
            ::log::debug!("Dropping image: {}", rejection)
        }
    }
}
