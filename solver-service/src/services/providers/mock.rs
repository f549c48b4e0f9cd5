//! Mock vision model for testing.

use super::{ChatMessage, ProviderError, VisionModel};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

enum Behavior {
    Reply(String),
    Fail(String),
}

/// A recorded call to the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

/// Mock vision model that answers with a canned reply or a canned failure.
pub struct MockVisionModel {
    behavior: Behavior,
    latency: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockVisionModel {
    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(text.into()))
    }

    /// Always fail as if the network dropped with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Simulate provider latency before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionModel for MockVisionModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                model: model.to_string(),
            });
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail(message) => Err(ProviderError::NetworkError(message.clone())),
        }
    }
}
