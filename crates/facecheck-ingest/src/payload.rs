//! Text-encoded (base64 / data URL) upload payloads.

use crate::error::IngestError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

/// Declared content type assumed when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Decode a base64 payload, stripping a `data:...;base64,` header if present.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>, IngestError> {
    let body = match data.trim_start().strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or("", |(_, body)| body),
        None => data,
    };
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Format a text-encoded upload is re-encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Png,
    Gif,
    Jpeg,
}

impl TargetFormat {
    /// PNG and GIF are honoured; every other declared type becomes JPEG.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let declared = content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_ascii_lowercase();
        if declared.contains("image/png") {
            TargetFormat::Png
        } else if declared.contains("image/gif") {
            TargetFormat::Gif
        } else {
            TargetFormat::Jpeg
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Png => "png",
            TargetFormat::Gif => "gif",
            TargetFormat::Jpeg => "jpg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Gif => ImageFormat::Gif,
            TargetFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_base64() {
        assert_eq!(decode_base64_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_data_url_header_stripped_at_first_comma() {
        let decoded = decode_base64_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_embedded_newlines_ignored() {
        assert_eq!(decode_base64_payload("aGVs\nbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode_base64_payload("!!not base64!!"),
            Err(IngestError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_target_format_mapping() {
        assert_eq!(TargetFormat::from_content_type(Some("image/png")), TargetFormat::Png);
        assert_eq!(TargetFormat::from_content_type(Some("IMAGE/GIF")), TargetFormat::Gif);
        assert_eq!(TargetFormat::from_content_type(Some("image/webp")), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::from_content_type(Some("")), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::from_content_type(None), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::from_content_type(None).extension(), "jpg");
        assert_eq!(TargetFormat::Png.extension(), "png");
    }
}
