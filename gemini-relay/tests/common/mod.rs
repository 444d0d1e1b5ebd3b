//! Shared setup for gemini-relay integration tests.

#![allow(dead_code)]

use gemini_relay::config::{GoogleConfig, ModelConfig, RelayConfig, UploadConfig};
use gemini_relay::services::providers::mock::MockProvider;
use gemini_relay::services::ModelProvider;
use gemini_relay::startup::Application;
use service_core::config::Config as CoreConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const MOCK_OUTPUT: &str = "Once upon a time, a relay answered.";

/// Small PNG header, enough to stand in for an image upload.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x01];

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub client: reqwest::Client,
}

pub fn test_config(upload_dir: &Path) -> RelayConfig {
    RelayConfig {
        common: CoreConfig { port: 0 },
        google: GoogleConfig {
            api_key: "test-api-key".to_string(),
        },
        model: ModelConfig {
            name: "gemini-2.0-flash".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
        },
        uploads: UploadConfig {
            dir: upload_dir.to_string_lossy().into_owned(),
            max_bytes: 1024 * 1024,
        },
    }
}

impl TestApp {
    /// Spawn the relay on a random port backed by `provider`.
    pub async fn spawn(provider: Arc<dyn ModelProvider>) -> Self {
        let upload_dir = PathBuf::from(format!("target/test-uploads-{}", Uuid::new_v4()));

        let app = Application::build_with_provider(test_config(&upload_dir), provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            upload_dir,
            client,
        }
    }

    /// Spawn with a mock that answers `MOCK_OUTPUT`.
    pub async fn spawn_replying() -> (Self, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::replying(MOCK_OUTPUT));
        let app = Self::spawn(provider.clone()).await;
        (app, provider)
    }

    /// Spawn with a mock that always fails with `message`.
    pub async fn spawn_failing(message: &str) -> (Self, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::failing(message));
        let app = Self::spawn(provider.clone()).await;
        (app, provider)
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Files currently staged in the upload directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        staged_files_in(&self.upload_dir)
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.upload_dir).await;
    }
}

pub fn staged_files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

/// Multipart form with one file part.
pub fn file_form(
    field: &str,
    bytes: &[u8],
    file_name: &str,
    mime: &str,
) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        field.to_string(),
        reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap(),
    )
}
