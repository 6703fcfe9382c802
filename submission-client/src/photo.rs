//! Photo payloads: loading, validation and downscaling before upload.

use crate::error::SubmissionError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::Path;

/// MIME types the relay's workflow accepts.
pub const ACCEPTED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Largest image sent to the relay (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// Bounds for [`downscale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownscaleOptions {
    pub max_dimension: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for DownscaleOptions {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            quality: 80,
        }
    }
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Read an image file, taking its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SubmissionError> {
        let path = path.as_ref();
        let content_type = content_type_for(path).ok_or_else(|| {
            SubmissionError::InvalidImage(format!(
                "Unsupported image type: {}",
                path.display()
            ))
        })?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            SubmissionError::InvalidImage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        Ok(Self::new(bytes, filename, content_type))
    }

    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.bytes.is_empty() {
            return Err(SubmissionError::InvalidImage("Image is empty".to_string()));
        }
        if !ACCEPTED_TYPES.contains(&self.content_type.as_str()) {
            return Err(SubmissionError::InvalidImage(format!(
                "Unsupported image type: {}",
                self.content_type
            )));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(SubmissionError::InvalidImage(format!(
                "Image is too large ({} bytes, max {})",
                self.bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        Ok(())
    }
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Scale `(width, height)` so the longer side is at most `max_dimension`,
/// keeping the aspect ratio. Never upscales.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }
    let scale = |side: u32| ((side as u64 * max_dimension as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

/// Re-encode the image as JPEG within `options.max_dimension`.
///
/// Deterministic: the same source pixels and options give the same bytes.
pub fn downscale(
    payload: &ImagePayload,
    options: DownscaleOptions,
) -> Result<ImagePayload, SubmissionError> {
    let source = image::load_from_memory(&payload.bytes)
        .map_err(|e| SubmissionError::InvalidImage(format!("Failed to decode image: {}", e)))?;

    let (width, height) = bounded_dimensions(source.width(), source.height(), options.max_dimension);
    let resized = if (width, height) == (source.width(), source.height()) {
        source
    } else {
        source.resize_exact(width, height, FilterType::Triangle)
    };

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, options.quality.clamp(1, 100))
        .encode_image(&resized.to_rgb8())
        .map_err(|e| SubmissionError::InvalidImage(format!("Failed to encode image: {}", e)))?;

    tracing::debug!(
        from_bytes = payload.bytes.len(),
        to_bytes = bytes.len(),
        width,
        height,
        "Downscaled image"
    );

    let stem = Path::new(&payload.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    Ok(ImagePayload::new(bytes, format!("{}.jpg", stem), "image/jpeg"))
}
