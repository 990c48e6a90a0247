//! Media attachment storage.
//!
//! Persists uploaded attachments on the local filesystem under a configured
//! root directory and serves them through a public URL prefix.

use std::path::PathBuf;

use crate::{AppError, AppResult, config::MediaConfig};

/// Media store for uploaded attachments.
///
/// The root directory and public URL prefix are injected at construction
/// from [`MediaConfig`]; nothing here is process-global.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    /// Create a new media store from configuration.
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store an attachment and return its public URL.
    ///
    /// The file is written under a collision-resistant generated name that
    /// keeps the original name as a suffix for traceability. The root
    /// directory is created if absent. Write failures are surfaced as
    /// [`AppError::Storage`].
    pub async fn store(&self, data: &[u8], original_name: &str) -> AppResult<String> {
        let name = generate_media_name(original_name);
        let path = self.root.join(&name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create media directory: {e}")))?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write media file: {e}")))?;

        Ok(format!("{}/{}", self.base_url, name))
    }

    /// Delete an attachment by its public URL.
    ///
    /// Idempotent: an already-absent file is not an error. Other failures
    /// are reported to the caller, who decides whether they are fatal.
    pub async fn delete(&self, url: &str) -> AppResult<()> {
        let Some(name) = self.name_from_url(url) else {
            // URL outside our prefix; nothing to delete
            return Ok(());
        };

        let path = self.root.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete media file: {e}"))),
        }
    }

    /// Public URL prefix under which attachments are served.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Root directory holding stored attachments.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn name_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(&self.base_url)?;
        let name = rest.trim_start_matches('/');
        // Reject anything that could escape the root
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(name)
    }
}

/// Generate a collision-resistant filename for a stored attachment.
///
/// The original name is preserved as a suffix so operators can trace a
/// stored file back to its upload.
#[must_use]
pub fn generate_media_name(original_name: &str) -> String {
    let sanitized: String = original_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}_{}", uuid::Uuid::new_v4(), sanitized)
}
