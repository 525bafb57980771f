/// Uploaded post images on local disk
///
/// Files live under a configured media root and are referenced by a relative
/// key such as `posts/<uuid>.gif`; that key is what `posts.image` stores.
use actix_web::web::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, FieldErrors, Result};

/// Directory under the media root that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Detect the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gif" => Some(ImageFormat::Gif),
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Gif => "image/gif",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// An upload that passed the size and format checks but is not on disk yet.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub format: ImageFormat,
    pub bytes: Bytes,
}

fn image_error(message: impl Into<String>) -> AppError {
    let mut fields = FieldErrors::new();
    fields.add("image", message);
    AppError::Validation(fields)
}

pub struct MediaStorage {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Error reported when an upload grows past the limit.
    pub fn too_large(&self) -> AppError {
        image_error(format!(
            "Upload a file smaller than {} bytes.",
            self.max_upload_bytes
        ))
    }

    /// Accept `bytes` as a post image or fail with an `image` field error.
    pub fn check_image(&self, bytes: Bytes) -> Result<ImageUpload> {
        if bytes.is_empty() {
            return Err(image_error("The submitted file is empty."));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(self.too_large());
        }
        let format = ImageFormat::sniff(&bytes).ok_or_else(|| image_error(INVALID_IMAGE))?;
        Ok(ImageUpload { format, bytes })
    }

    /// Write the image under a fresh name and return its key.
    pub async fn save(&self, image: &ImageUpload) -> Result<String> {
        let key = format!(
            "{}/{}.{}",
            POST_IMAGE_DIR,
            Uuid::new_v4(),
            image.format.extension()
        );
        let path = self.root.join(&key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Internal(format!("create {}: {}", dir.display(), e)))?;
        }
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("write {}: {}", path.display(), e)))?;

        info!(%key, size = image.bytes.len(), "image stored");
        Ok(key)
    }

    /// Read a stored file back. Keys that leave the media root are not found.
    pub async fn open(&self, key: &str) -> Result<(ImageFormat, Bytes)> {
        let not_found = || AppError::NotFound(format!("media '{}'", key));

        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(not_found());
        }
        let format = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .ok_or_else(not_found)?;

        match tokio::fs::read(self.root.join(relative)).await {
            Ok(bytes) => Ok((format, Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(AppError::Internal(format!("read media '{}': {}", key, e))),
        }
    }
}
