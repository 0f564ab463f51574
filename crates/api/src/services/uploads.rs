//! Local storage for uploaded images.
//!
//! Files are written to the configured upload directory under a random name
//! and served back from `/uploads`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file has no extension or one that is not an image type we accept.
    #[error("unsupported file type; allowed: png, jpg, jpeg, gif, webp")]
    UnsupportedType,

    /// The file is empty.
    #[error("uploaded file is empty")]
    Empty,

    /// Writing to disk failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded files into a directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create a store writing into `dir`. The directory is created on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save `bytes` and return the public URL of the stored file.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` if `original_name` does not end
    /// in an allowed image extension, `UploadError::Empty` for an empty file,
    /// and `UploadError::Io` if the write fails.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, UploadError> {
        let extension = original_name
            .and_then(image_extension)
            .ok_or(UploadError::UnsupportedType)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let file_name = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored upload");
        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }
}

/// Lowercased extension of `name` if it is an accepted image type.
fn image_extension(name: &str) -> Option<String> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}
