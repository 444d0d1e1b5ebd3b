//! Shapes ingress payloads into model input.

use crate::models::{GenerateTextRequest, InlineData, InlinePart, MediaKind, ModelInput};
use crate::services::staging::StagedUpload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io;

/// Text route: the prompt goes through untouched, even when absent.
pub fn text_input(request: GenerateTextRequest) -> ModelInput {
    ModelInput::Prompt(request.prompt)
}

/// Base64-encode `bytes` into an inline data part.
pub fn inline_part(bytes: &[u8], mime_type: &str) -> InlinePart {
    InlinePart {
        inline_data: InlineData {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.to_string(),
        },
    }
}

/// File routes: `[instruction, inlineData]` built from the staged upload.
pub async fn media_input(
    kind: MediaKind,
    prompt: Option<String>,
    upload: &StagedUpload,
) -> io::Result<ModelInput> {
    let bytes = upload.read().await?;

    Ok(ModelInput::Parts {
        instruction: kind.instruction(prompt),
        part: inline_part(&bytes, upload.mime_type()),
    })
}
