//! Vision model provider abstractions and implementations.
//!
//! The solver only depends on [`VisionModel`], so the hosted OpenAI client
//! and the mock used in tests are interchangeable.

pub mod messages;
pub mod mock;
pub mod openai;

pub use messages::{create_image_message, ChatMessage, ContentPart, ImageUrl, Role};

use async_trait::async_trait;
use thiserror::Error;

/// Low-cost multimodal model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::AuthenticationFailed(_) => "authentication_failed",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// A hosted model that can read images and answer in text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `messages` to `model` and return the text of the reply.
    ///
    /// One outbound call per invocation; no retries.
    async fn complete(&self, messages: &[ChatMessage], model: &str)
        -> Result<String, ProviderError>;
}
