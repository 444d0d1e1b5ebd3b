use serde::{Deserialize, Serialize};

/// Prompt used by the image route when the caller sends none.
pub const DEFAULT_IMAGE_PROMPT: &str = "describe the image";

/// Fixed task instruction for the document route.
pub const DOCUMENT_INSTRUCTION: &str = "Analyze this document:";

/// Fixed task instruction for the audio route.
pub const AUDIO_INSTRUCTION: &str = "Transcribe the following audio:";

/// JSON body of `POST /generate-text`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateTextRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Successful response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationOutput {
    pub output: String,
}

/// Raw content bytes (base64) with their MIME type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

/// Content fragment shaped as `{"inlineData": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlinePart {
    pub inline_data: InlineData,
}

/// What the model provider receives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelInput {
    /// Text route. `None` when the caller omitted `prompt`.
    Prompt(Option<String>),

    /// File routes: instruction text followed by the uploaded content.
    Parts { instruction: String, part: InlinePart },
}

impl ModelInput {
    /// Text portion of the input, if any.
    pub fn prompt_text(&self) -> Option<&str> {
        match self {
            ModelInput::Prompt(prompt) => prompt.as_deref(),
            ModelInput::Parts { instruction, .. } => Some(instruction),
        }
    }
}

/// Upload routes and their per-route contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Document,
    Audio,
}

impl MediaKind {
    /// Multipart field carrying the file.
    pub fn field_name(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
        }
    }

    /// Route label used in logs and metrics.
    pub fn route(self) -> &'static str {
        match self {
            MediaKind::Image => "generate-from-image",
            MediaKind::Document => "generate-from-document",
            MediaKind::Audio => "generate-from-audio",
        }
    }

    /// Instruction sent ahead of the file.
    ///
    /// Only the image route honours the caller's prompt; an empty prompt
    /// counts as missing.
    pub fn instruction(self, prompt: Option<String>) -> String {
        match self {
            MediaKind::Image => prompt
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_string()),
            MediaKind::Document => DOCUMENT_INSTRUCTION.to_string(),
            MediaKind::Audio => AUDIO_INSTRUCTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_prompt_defaults_when_missing_or_empty() {
        assert_eq!(MediaKind::Image.instruction(None), DEFAULT_IMAGE_PROMPT);
        assert_eq!(
            MediaKind::Image.instruction(Some(String::new())),
            DEFAULT_IMAGE_PROMPT
        );
        assert_eq!(
            MediaKind::Image.instruction(Some("count the cats".to_string())),
            "count the cats"
        );
    }

    #[test]
    fn document_and_audio_ignore_caller_prompt() {
        let prompt = Some("ignore me".to_string());
        assert_eq!(
            MediaKind::Document.instruction(prompt.clone()),
            DOCUMENT_INSTRUCTION
        );
        assert_eq!(MediaKind::Audio.instruction(prompt), AUDIO_INSTRUCTION);
    }

    #[test]
    fn inline_part_uses_camel_case_wire_names() {
        let part = InlinePart {
            inline_data: InlineData {
                data: "AAEC".to_string(),
                mime_type: "image/png".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"inlineData": {"data": "AAEC", "mimeType": "image/png"}})
        );
    }

    #[test]
    fn text_request_tolerates_missing_prompt() {
        let req: GenerateTextRequest = serde_json::from_str("{}").unwrap();
        assert!(req.prompt.is_none());
    }
}
