//! Mock provider for testing.

use super::{ModelProvider, ProviderError, ProviderOutput};
use crate::models::ModelInput;
use async_trait::async_trait;
use std::sync::Mutex;

enum MockBehavior {
    Reply(String),
    Fail(String),
}

/// Provider that records every input and answers with a canned result.
pub struct MockProvider {
    behavior: MockBehavior,
    calls: Mutex<Vec<ModelInput>>,
}

impl MockProvider {
    /// Always succeed with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Reply(text.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Inputs received so far, oldest first.
    pub fn calls(&self) -> Vec<ModelInput> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, input: &ModelInput) -> Result<ProviderOutput, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(input.clone());
        }

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(ProviderOutput {
                text: text.clone(),
                input_tokens: input.prompt_text().map(|p| p.len() as i32 / 4).unwrap_or(0),
                output_tokens: text.len() as i32 / 4,
            }),
            MockBehavior::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }
}
