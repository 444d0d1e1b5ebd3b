//! Generation routes.
//!
//! Each request goes Received -> Staged -> Dispatched -> Succeeded/Failed ->
//! CleanedUp -> ResponseSent. The staged upload is always discarded before
//! the response is built.

use crate::error::GenerationError;
use crate::models::{GenerateTextRequest, GenerationOutput, MediaKind, ModelInput};
use crate::services::{metrics, request_builder, StagedUpload, UploadStager};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, rejection::BytesRejection, Multipart, State},
    http::{header, HeaderMap},
    Extension, Json,
};
use service_core::middleware::RequestId;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

/// MIME type assumed when a file part carries no Content-Type.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

type GenerationResult = Result<Json<GenerationOutput>, GenerationError>;

type MaybeRequestId = Option<Extension<RequestId>>;

pub async fn generate_text(
    State(state): State<AppState>,
    request_id: MaybeRequestId,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> GenerationResult {
    let started = Instant::now();
    let result = relay_text(&state, &headers, body).await;
    finish("generate-text", request_id_field(&request_id), started, result)
}

pub async fn generate_from_image(
    State(state): State<AppState>,
    request_id: MaybeRequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> GenerationResult {
    generate_from_media(state, request_id, MediaKind::Image, multipart).await
}

pub async fn generate_from_document(
    State(state): State<AppState>,
    request_id: MaybeRequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> GenerationResult {
    generate_from_media(state, request_id, MediaKind::Document, multipart).await
}

pub async fn generate_from_audio(
    State(state): State<AppState>,
    request_id: MaybeRequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> GenerationResult {
    generate_from_media(state, request_id, MediaKind::Audio, multipart).await
}

async fn generate_from_media(
    state: AppState,
    request_id: MaybeRequestId,
    kind: MediaKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> GenerationResult {
    let started = Instant::now();

    let result = match multipart {
        Ok(mut multipart) => relay_upload(&state, kind, &mut multipart).await,
        Err(e) => Err(e.into()),
    };

    finish(kind.route(), request_id_field(&request_id), started, result)
}

/// The id set by the request-id middleware, or `-` when it did not run.
fn request_id_field(request_id: &MaybeRequestId) -> &str {
    request_id
        .as_ref()
        .map(|Extension(RequestId(id))| id.as_str())
        .unwrap_or("-")
}

async fn relay_text(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<String, GenerationError> {
    let request = parse_text_request(headers, &body?)?;
    let input = request_builder::text_input(request);
    dispatch(state, &input).await
}

/// Only JSON bodies are parsed; anything else counts as a request without a
/// prompt.
fn parse_text_request(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<GenerateTextRequest, GenerationError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateTextRequest::default());
    }

    Ok(serde_json::from_slice(body)?)
}

async fn relay_upload(
    state: &AppState,
    kind: MediaKind,
    multipart: &mut Multipart,
) -> Result<String, GenerationError> {
    let (upload, prompt) = receive_upload(&state.stager, kind, multipart).await?;

    let outcome = match request_builder::media_input(kind, prompt, &upload).await {
        Ok(input) => dispatch(state, &input).await,
        Err(e) => Err(e.into()),
    };

    let path = upload.path().to_path_buf();
    if let Err(e) = upload.discard().await {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove staged upload"
        );
    }

    outcome
}

/// Stage the route's file and collect the optional `prompt` field.
async fn receive_upload(
    stager: &UploadStager,
    kind: MediaKind,
    multipart: &mut Multipart,
) -> Result<(StagedUpload, Option<String>), GenerationError> {
    let mut upload: Option<StagedUpload> = None;
    let mut prompt: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            if name != kind.field_name() || upload.is_some() {
                return Err(GenerationError::UnexpectedField(name));
            }

            let mime_type = field
                .content_type()
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string();
            let original_name = field.file_name().map(str::to_string);

            let (staged, mut file) = stager
                .create(original_name.as_deref(), &mime_type)
                .await?;

            let mut size = 0usize;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len();
                file.write_all(&chunk).await?;
            }
            file.flush().await?;

            tracing::info!(
                route = kind.route(),
                field = %name,
                mime_type = %mime_type,
                size,
                "Upload staged"
            );

            upload = Some(staged);
        } else if name == "prompt" {
            prompt = Some(field.text().await?);
        }
    }

    let upload = upload.ok_or(GenerationError::MissingFile(kind.field_name()))?;
    Ok((upload, prompt))
}

/// Hand the input to the model provider and keep its metrics.
async fn dispatch(state: &AppState, input: &ModelInput) -> Result<String, GenerationError> {
    let provider = &state.provider;
    let started = Instant::now();

    let result = provider.generate(input).await;

    metrics::record_provider_latency(
        provider.name(),
        provider.model(),
        started.elapsed().as_secs_f64(),
    );

    match result {
        Ok(output) => {
            metrics::record_tokens(provider.model(), output.input_tokens, output.output_tokens);
            Ok(output.text)
        }
        Err(e) => {
            metrics::record_provider_error(provider.name(), e.kind());
            Err(e.into())
        }
    }
}

fn finish(
    route: &'static str,
    request_id: &str,
    started: Instant,
    result: Result<String, GenerationError>,
) -> GenerationResult {
    let duration = started.elapsed().as_secs_f64();

    match result {
        Ok(output) => {
            metrics::record_request(route, "200", duration);
            tracing::info!(
                route,
                request_id,
                duration_secs = duration,
                "Generation completed"
            );
            Ok(Json(GenerationOutput { output }))
        }
        Err(e) => {
            metrics::record_request(route, "500", duration);
            tracing::error!(route, request_id, error = %e, "Generation failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    #[test]
    fn request_id_comes_from_the_extension() {
        let request_id = Some(Extension(RequestId("req-42".to_string())));
        assert_eq!(request_id_field(&request_id), "req-42");
        assert_eq!(request_id_field(&None), "-");
    }

    #[test]
    fn parses_prompt_from_json() {
        let request = parse_text_request(&json_headers(), br#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(request.prompt.as_deref(), Some("hi"));
    }

    #[test]
    fn empty_json_body_has_no_prompt() {
        let request = parse_text_request(&json_headers(), b"  ").unwrap();
        assert!(request.prompt.is_none());
    }

    #[test]
    fn non_json_body_is_not_parsed() {
        let request = parse_text_request(&HeaderMap::new(), b"prompt=hi").unwrap();
        assert!(request.prompt.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_text_request(&json_headers(), b"{not json").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson(_)));
    }

    #[test]
    fn non_string_prompt_is_an_error() {
        let err = parse_text_request(&json_headers(), br#"{"prompt": 5}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson(_)));
    }
}
