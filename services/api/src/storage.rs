//! Local media storage for uploaded recipe images

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Largest accepted upload
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Formats accepted for recipe images
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Directory, relative to the media root, that recipe images are written to
const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Error, Debug)]
pub enum StorageError {
    /// The payload is not an acceptable image
    #[error("{0}")]
    InvalidImage(String),

    #[error("Media storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image validation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Detect the format from the content and make sure the image fully decodes
pub fn validate_image(data: &[u8]) -> Result<ImageFormat, String> {
    if data.is_empty() {
        return Err("The submitted file is empty".to_string());
    }

    if data.len() > MAX_IMAGE_SIZE {
        return Err(format!(
            "File too large. Maximum size is {} bytes",
            MAX_IMAGE_SIZE
        ));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader.format().ok_or_else(|| {
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image"
            .to_string()
    })?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    reader.decode().map_err(|e| {
        format!(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image ({})",
            e
        )
    })?;

    Ok(format)
}

/// Files under a root directory, published under a URL prefix
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        let base_url = format!("/{}", base_url.trim_matches('/'));
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix the media root is served under, e.g. `/media`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of a stored path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Validate and store a recipe image under a fresh name.
    /// Returns the stored path relative to the media root.
    pub async fn save_recipe_image(&self, data: Vec<u8>) -> Result<String, StorageError> {
        let (format, data) = tokio::task::spawn_blocking(move || {
            validate_image(&data).map(|format| (format, data))
        })
        .await?
        .map_err(StorageError::InvalidImage)?;

        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), extension);

        let destination = self.root.join(&relative);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, &data).await?;

        info!("Stored recipe image at {}", destination.display());
        Ok(relative)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, path: &str) {
        let target = self.root.join(path);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => info!("Removed media file {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove media file {}: {}", target.display(), e),
        }
    }
}
