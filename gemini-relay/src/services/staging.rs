//! Temporary storage for uploaded files.
//!
//! Every upload is written under the stager's directory with a fresh UUID
//! name and owned by a [`StagedUpload`] guard. The guard removes the file
//! exactly once: through [`StagedUpload::discard`] on the normal path, or on
//! drop if the request bailed out before reaching it.

use service_core::error::AppError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use uuid::Uuid;

/// Longest file extension carried over from the client's file name.
const MAX_EXTENSION_LEN: usize = 10;

/// Creates staged uploads in one directory.
#[derive(Debug, Clone)]
pub struct UploadStager {
    dir: PathBuf,
}

impl UploadStager {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create an empty staged file and return it open for writing.
    pub async fn create(
        &self,
        original_name: Option<&str>,
        mime_type: &str,
    ) -> io::Result<(StagedUpload, File)> {
        let mut file_name = Uuid::new_v4().to_string();
        if let Some(ext) = original_name.and_then(safe_extension) {
            file_name.push('.');
            file_name.push_str(&ext);
        }
        let path = self.dir.join(file_name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        tracing::debug!(path = %path.display(), mime_type, "Staged upload created");

        Ok((
            StagedUpload {
                path,
                mime_type: mime_type.to_string(),
                removed: false,
            },
            file,
        ))
    }
}

/// Lowercase alphanumeric extension of `name`, if it has a usable one.
fn safe_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
}

/// An uploaded file on disk, removed when the guard is done with it.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    mime_type: String,
    removed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Read the staged bytes back.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }

    /// Delete the file. Called once the model call has finished either way.
    pub async fn discard(mut self) -> io::Result<()> {
        self.removed = true;
        fs::remove_file(&self.path).await
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove staged upload"
                );
            }
        }
    }
}
