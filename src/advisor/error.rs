use thiserror::Error;

/// Failures while obtaining advisory text.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("advisor returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("advisor response contained no choices")]
    EmptyResponse,

    #[error("advisor is not configured: {0}")]
    Config(String),
}
