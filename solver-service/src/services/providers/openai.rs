//! OpenAI-compatible chat completion provider.
//!
//! Sends multimodal messages to `{base_url}/chat/completions` and returns the
//! first choice's text. No retries and no explicit timeout: the transport's
//! defaults apply.

use super::{ChatMessage, ProviderError, VisionModel};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub temperature: f32,
}

/// Vision model backed by an OpenAI-compatible HTTP API.
pub struct OpenAiVisionModel {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiVisionModel {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("solver-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "At least one message is required".to_string(),
            ));
        }

        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("OPENAI_API_KEY is not set".to_string())
        })?;

        let request = ChatCompletionRequest {
            model,
            messages,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            model = %model,
            message_count = messages.len(),
            "Sending request to chat completions API"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationFailed(format!("{}: {}", status, error_text))
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    ProviderError::RateLimited(format!("{}: {}", status, error_text))
                }
                _ => ProviderError::ApiError(format!(
                    "Chat completions API error {}: {}",
                    status, error_text
                )),
            });
        }

        let api_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        if let Some(usage) = &api_response.usage {
            tracing::debug!(
                model = %model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion finished"
            );
        }

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("Response contained no message content".to_string())
            })
    }
}

// ============================================================================
// Chat completions API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
