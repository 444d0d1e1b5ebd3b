//! Model provider abstraction.
//!
//! Handlers only see the `ModelProvider` trait, so the Gemini backend can be
//! swapped for the recording mock in tests.

pub mod gemini;
pub mod mock;

use crate::models::ModelInput;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label for the error metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// Text produced by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOutput {
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// Generative model backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Run one generation.
    async fn generate(&self, input: &ModelInput) -> Result<ProviderOutput, ProviderError>;
}
