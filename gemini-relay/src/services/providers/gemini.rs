//! Gemini AI provider implementation.
//!
//! Calls `models/{model}:generateContent` on Google's Generative Language
//! API with a single user turn.

use super::{ModelProvider, ProviderError, ProviderOutput};
use crate::models::{InlinePart, ModelInput};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Gemini generateContent provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method,
            self.config.api_key
        )
    }
}

/// Convert relay input into the request body.
fn build_request(input: &ModelInput) -> Result<GenerateContentRequest, ProviderError> {
    let parts = match input {
        ModelInput::Prompt(Some(prompt)) => vec![ContentPart::Text {
            text: prompt.clone(),
        }],
        ModelInput::Prompt(None) => {
            return Err(ProviderError::InvalidRequest(
                "prompt is required".to_string(),
            ))
        }
        ModelInput::Parts { instruction, part } => vec![
            ContentPart::Text {
                text: instruction.clone(),
            },
            ContentPart::InlineData(part.clone()),
        ],
    };

    Ok(GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
    })
}

/// Join the text parts of the first candidate.
fn extract_output(response: GenerateContentResponse) -> Result<ProviderOutput, ProviderError> {
    let candidate = match response.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            if let Some(reason) = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
            {
                tracing::warn!(block_reason = %reason, "Gemini blocked the prompt");
                return Err(ProviderError::ContentFiltered);
            }
            return Err(ProviderError::ApiError(
                "Response contained no candidates".to_string(),
            ));
        }
    };

    match candidate.finish_reason.as_deref() {
        Some("SAFETY") => return Err(ProviderError::ContentFiltered),
        Some(reason @ ("RECITATION" | "LANGUAGE")) => {
            tracing::warn!(finish_reason = %reason, "Gemini stopped the candidate");
            return Err(ProviderError::ApiError(format!(
                "Candidate was blocked due to {}",
                reason
            )));
        }
        _ => {}
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text),
            ContentPart::InlineData(_) => None,
        })
        .collect();

    let usage = response.usage_metadata.unwrap_or_default();

    Ok(ProviderOutput {
        text,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
    })
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, input: &ModelInput) -> Result<ProviderOutput, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = build_request(input)?;
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            parts = request.contents[0].parts.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_output(api_response)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    InlineData(InlinePart),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}
