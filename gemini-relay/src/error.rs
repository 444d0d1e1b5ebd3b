use crate::services::ProviderError;
use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Any failure while serving a generation request.
///
/// Every variant is reported to the caller the same way: HTTP 500 with the
/// error's message.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to read request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid multipart request: {0}")]
    InvalidMultipart(#[from] MultipartRejection),

    #[error("Failed to read multipart field: {}", multipart_detail(.0))]
    Multipart(#[from] MultipartError),

    #[error("No file uploaded in field '{0}'")]
    MissingFile(&'static str),

    #[error("Unexpected field: {0}")]
    UnexpectedField(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The multipart error's `Display` hides its cause, so report the body text,
/// or the size limit when that is what stopped the upload.
fn multipart_detail(error: &MultipartError) -> String {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "upload exceeds the size limit".to_string()
    } else {
        error.body_text()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_failure_is_a_500_with_message() {
        let response =
            GenerationError::Provider(ProviderError::ApiError("quota".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "API error: quota"}));
    }

    #[test]
    fn missing_file_names_the_field() {
        assert_eq!(
            GenerationError::MissingFile("image").to_string(),
            "No file uploaded in field 'image'"
        );
    }
}
