use async_trait::async_trait;
use std::fmt;

use crate::errors::ApiError;

#[derive(Debug, Clone)]
pub enum GenerationError {
    /// No answer within the configured timeout.
    Timeout(String),
    /// Transport failure before a response arrived.
    RequestError(String),
    /// Non-success status from the service.
    ApiError { status: u16, message: String },
    /// Success status but no usable completion text.
    ResponseError(String),
    EnvironmentError(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            GenerationError::RequestError(msg) => write!(f, "Request error: {}", msg),
            GenerationError::ApiError { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            GenerationError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            GenerationError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(msg) => ApiError::UpstreamTimeout(msg),
            other => ApiError::UpstreamFailure(other.to_string()),
        }
    }
}

/// A text-completion capability: given a system instruction and a prompt,
/// return the model's reply as plain text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}
