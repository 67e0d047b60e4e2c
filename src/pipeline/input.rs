//! Input resolution: turn a user-supplied path or URL into a validated image.
//!
//! The drawing is held in memory for its whole life: the bytes are sent to
//! the model, decoded again by the renderer, and compared on reload to decide
//! whether the session must be reset. Only PNG and JPEG are accepted, and
//! the dimensions are read up front so a bad upload fails here rather than
//! after a paid model call.

use crate::error::DrawingError;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info};

/// An uploaded drawing: raw bytes plus what we learned from sniffing them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingImage {
    /// Display name (file name or last URL segment).
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl DrawingImage {
    /// Validate raw bytes as a PNG or JPEG drawing.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DrawingError> {
        let name = name.into();

        let format = match image::guess_format(&bytes) {
            Ok(f @ (ImageFormat::Png | ImageFormat::Jpeg)) => f,
            _ => {
                return Err(DrawingError::UnsupportedImage {
                    magic: bytes.iter().take(4).copied().collect(),
                    name,
                })
            }
        };

        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| DrawingError::ImageDecodeFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        debug!("Drawing '{}': {:?} {}x{} px", name, format, width, height);

        Ok(Self {
            name,
            bytes,
            format,
            width,
            height,
        })
    }

    /// MIME type sent to the model.
    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            _ => "image/png",
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory drawing.
///
/// If the input is a URL, download it. If it is a local file, read it.
pub async fn resolve_drawing(input: &str, timeout_secs: u64) -> Result<DrawingImage, DrawingError> {
    if input.trim().is_empty() {
        return Err(DrawingError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

/// Read a local file, mapping I/O failures onto input errors.
async fn resolve_local(path_str: &str) -> Result<DrawingImage, DrawingError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DrawingError::PermissionDenied { path });
        }
        Err(_) => return Err(DrawingError::FileNotFound { path }),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Resolved local drawing: {}", path.display());
    DrawingImage::from_bytes(name, bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<DrawingImage, DrawingError> {
    info!("Downloading drawing from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DrawingError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DrawingError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DrawingError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DrawingError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DrawingError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    DrawingImage::from_bytes(filename_from_url(url), bytes.to_vec())
}

/// Last non-empty path segment of the URL, or a fixed fallback.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded-drawing".to_string()
}
