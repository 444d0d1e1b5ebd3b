//! Domain models for the relay.

pub mod generation;

pub use generation::{
    GenerateTextRequest, GenerationOutput, InlineData, InlinePart, MediaKind, ModelInput,
    AUDIO_INSTRUCTION, DEFAULT_IMAGE_PROMPT, DOCUMENT_INSTRUCTION,
};
