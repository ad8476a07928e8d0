use scopecast_core::EstimateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// No credential in the configured environment variable. Shown to the
    /// user verbatim.
    #[error("no API key configured: set the {env} environment variable")]
    NoApiKey { env: String },

    #[error("request to the generation service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned no content (finish reason: {finish_reason})")]
    Empty { finish_reason: String },

    #[error("failed to parse generated estimate: {0}")]
    Parse(String),

    #[error(transparent)]
    Rejected(#[from] EstimateError),
}

impl AiError {
    /// `true` for failures the user fixes in their environment rather than
    /// by retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AiError::NoApiKey { .. })
    }
}
