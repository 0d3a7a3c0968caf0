use thiserror::Error;

/// Errors that abort setting up a pipeline run
///
/// Failures while processing a page or an individual candidate are never
/// surfaced through this type; they are logged and the candidate is dropped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure to obtain the bytes of a single image
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("image larger than {0} bytes")]
    TooLarge(usize),
}

/// Failure of the external content-classification service
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed: {0}")]
    Request(String),

    #[error("classification service returned status {0}")]
    Status(u16),

    #[error("malformed classification response: {0}")]
    Response(String),

    #[error("classification timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Why a single candidate did not make it into the results
#[derive(Debug, Error)]
pub enum CandidateRejection {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("{url} is not landscape ({width}x{height})")]
    NotLandscape { url: String, width: u32, height: u32 },

    #[error("{url} was not matched by the classifier")]
    NotMatched { url: String },

    #[error("classification failed for {url}: {source}")]
    Classification {
        url: String,
        #[source]
        source: ClassifyError,
    },
}
