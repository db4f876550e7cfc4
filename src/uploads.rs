//! Upload storage for images and videos embedded in posts.
//!
//! Files are stored flat under the upload directory with random hex
//! names (original extension preserved) and served back at
//! `/uploads/<name>`.

use crate::error::AppError;
use anyhow::Context;
use rand::RngCore;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filesystem store for uploaded media.
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Persist one uploaded file and return its public URL path.
    ///
    /// Only images and videos are accepted; anything else is a
    /// `MalformedRequest` at the boundary.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if !content_type.starts_with("image/") && !content_type.starts_with("video/") {
            return Err(AppError::MalformedRequest(
                "File must be an image or video".to_string(),
            ));
        }

        if data.is_empty() {
            return Err(AppError::MalformedRequest("Empty file".to_string()));
        }

        if data.len() > self.max_bytes {
            return Err(AppError::MalformedRequest(format!(
                "File exceeds the {} byte upload limit",
                self.max_bytes
            )));
        }

        let filename = format!("{}.{}", random_hex(), extension_for(original_name));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .context("Failed to create upload directory")?;

        let path = self.dir.join(&filename);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        info!(file = %filename, bytes = data.len(), "Stored upload");

        Ok(format!("/uploads/{filename}"))
    }
}

/// 16 random bytes as 32 hex characters.
fn random_hex() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Extension from the client-supplied name, restricted to something safe
/// to embed in a path.
fn extension_for(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(char::is_alphanumeric))
        .map(str::to_lowercase)
        .unwrap_or_else(|| "png".to_string())
}
