use crate::config::ModelConfig;
use crate::error::{ClassifyError, Error};
use crate::utils::{render_instruction, strip_reasoning, truncate_for_log};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// What is sent to the content-classification service
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'a> {
    pub instruction: &'a str,
    pub url: &'a Url,
    /// Encoded image, when the service should look at the pixels
    pub image: Option<&'a [u8]>,
}

/// External service that answers a natural-language question about an image
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Returns the free-form response text
    async fn classify(&self, request: &ClassificationRequest<'_>) -> Result<String, ClassifyError>;
}

/// Ollama `/api/generate` client
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClassifier {
    pub fn new(config: &ModelConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContentClassifier for OllamaClassifier {
    async fn classify(&self, request: &ClassificationRequest<'_>) -> Result<String, ClassifyError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: request.instruction,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
            images: request.image.map(|bytes| vec![STANDARD.encode(bytes)]),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Response(e.to_string()))?;
        Ok(parsed.response)
    }
}

/// Turns a classification service into a yes/no verdict for one image
#[derive(Clone)]
pub struct Judge {
    classifier: Arc<dyn ContentClassifier>,
    subject: String,
    instruction: String,
    affirmative_token: String,
    strip_reasoning: bool,
    send_image: bool,
    timeout: Duration,
}

impl std::fmt::Debug for Judge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Judge")
            .field("subject", &self.subject)
            .field("affirmative_token", &self.affirmative_token)
            .field("send_image", &self.send_image)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Judge {
    pub fn new(classifier: Arc<dyn ContentClassifier>, config: &ModelConfig) -> Self {
        Self {
            classifier,
            subject: config.subject.clone(),
            instruction: config.instruction.clone(),
            affirmative_token: config.affirmative_token.clone(),
            strip_reasoning: config.strip_reasoning,
            send_image: config.send_image,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Judge backed by a local Ollama server
    pub fn ollama(config: &ModelConfig) -> Result<Self, Error> {
        let classifier = OllamaClassifier::new(config)?;
        ::log::debug!("Using classification model {} at {}", config.model, classifier.endpoint());
        Ok(Self::new(Arc::new(classifier), config))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The instruction sent for one image
    pub fn instruction_for(&self, url: &Url) -> String {
        render_instruction(&self.instruction, &self.subject, url.as_str())
    }

    /// Plain substring check for the affirmative token
    ///
    /// A response carrying both an affirmative and a negative token counts
    /// as affirmative.
    pub fn is_affirmative(&self, response: &str) -> bool {
        let answer = if self.strip_reasoning {
            strip_reasoning(response)
        } else {
            response.into()
        };
        answer.contains(self.affirmative_token.as_str())
    }

    /// Ask the service about one image; errors mean "not matched" to the caller
    pub async fn judge(&self, url: &Url, bytes: &[u8]) -> Result<bool, ClassifyError> {
        let instruction = self.instruction_for(url);
        let request = ClassificationRequest {
            instruction: &instruction,
            url,
            image: self.send_image.then_some(bytes),
        };

        let response = tokio::time::timeout(self.timeout, self.classifier.classify(&request))
            .await
            .map_err(|_| ClassifyError::Timeout(self.timeout))??;

        let matched = self.is_affirmative(&response);
        ::log::debug!(
            "Classifier said {:?} for {} (matched: {})",
            truncate_for_log(response.trim(), 80),
            url,
            matched
        );
        Ok(matched)
    }
}
