//! Types shared by scene services.

use crate::error::{Result, StudioError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Aspect ratio hint for composites. Studio output is fixed at 4:3.
pub const COMPOSITE_ASPECT_RATIO: &str = "4:3";

/// One fragment of a service response.
///
/// Callers scan the part list rather than assuming a shape; a response with
/// no inline part is a valid outcome, not a protocol violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenePart {
    /// Encoded image bytes with their media type.
    Inline {
        /// MIME type of the encoded payload.
        media_type: String,
        /// Base64-encoded image bytes.
        data: String,
    },
    /// A text fragment.
    Text(String),
}

/// A suggested refinement parsed from scene analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short display name.
    pub label: String,
    /// One imperative instruction sentence.
    pub description: String,
}

/// The finished composite returned by generation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated photo should be saved or displayed"]
pub struct GeneratedPhoto {
    media_type: String,
    data: Vec<u8>,
}

impl GeneratedPhoto {
    /// Creates a photo from decoded bytes and their media type.
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Decodes a photo from a base64 payload.
    pub fn from_base64(media_type: impl Into<String>, payload: &str) -> Result<Self> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StudioError::Decode(e.to_string()))?;
        Ok(Self::new(media_type, data))
    }

    /// MIME type reported by the service.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension matching the media type. Unknown types map to `png`.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.media_type)
    }

    /// The photo as a `data:` URL for direct display.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// Saves the photo to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Maps a MIME type to a file extension. Unknown types fall back to `png`.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Detects an image media type from magic bytes.
pub fn detect_media_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // WebP: RIFF....WEBP
    if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_photo_data_url() {
        let photo = GeneratedPhoto::new("image/png", b"foo".to_vec());
        assert_eq!(photo.to_data_url(), "data:image/png;base64,Zm9v");
    }

    #[test]
    fn test_photo_from_base64() {
        let photo = GeneratedPhoto::from_base64("image/png", "Zm9v").unwrap();
        assert_eq!(photo.data(), b"foo");
        assert_eq!(photo.size(), 3);
        assert_eq!(photo.media_type(), "image/png");
    }

    #[test]
    fn test_photo_from_invalid_base64_is_decode_error() {
        let err = GeneratedPhoto::from_base64("image/png", "!!not base64!!").unwrap_err();
        assert!(matches!(err, StudioError::Decode(_)));
    }

    #[test]
    fn test_photo_extension_follows_media_type() {
        assert_eq!(GeneratedPhoto::new("image/png", vec![]).extension(), "png");
        assert_eq!(GeneratedPhoto::new("image/jpeg", vec![]).extension(), "jpg");
        assert_eq!(GeneratedPhoto::new("image/webp", vec![]).extension(), "webp");
        assert_eq!(
            GeneratedPhoto::new("application/octet-stream", vec![]).extension(),
            "png"
        );
    }

    #[test]
    fn test_photo_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let photo = GeneratedPhoto::new("image/png", b"foo".to_vec());
        photo.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"foo");
    }

    #[test]
    fn test_detect_media_type_from_magic_bytes() {
        assert_eq!(detect_media_type(&PNG_MAGIC), Some("image/png"));
        assert_eq!(detect_media_type(&JPEG_MAGIC), Some("image/jpeg"));
        assert_eq!(detect_media_type(&WEBP_MAGIC), Some("image/webp"));
        assert_eq!(detect_media_type(b"not an image"), None);
        assert_eq!(detect_media_type(&[0xFF]), None);
    }
}
