use crate::validate::{MAX_DIMENSION, MIN_DIMENSION};
use thiserror::Error;

/// Why an upload was refused or could not be stored.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No file provided")]
    MissingFile,
    #[error("Invalid file type. Only PNG, JPG, JPEG, and GIF files are allowed")]
    UnsupportedFileType { filename: String },
    #[error("File too large. Maximum size is {}MB", max / (1024 * 1024))]
    PayloadTooLarge { size: usize, max: usize },
    #[error(transparent)]
    InvalidImage(#[from] ImageRejection),
    #[error("Invalid base64 image data")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// True for rejections caused by the client's payload.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Io(_))
    }
}

/// Payload is not an acceptable raster image.
#[derive(Error, Debug)]
pub enum ImageRejection {
    #[error("Image too small (minimum {MIN_DIMENSION}x{MIN_DIMENSION} pixels)")]
    TooSmall { width: u32, height: u32 },
    #[error("Image too large (maximum {MAX_DIMENSION}x{MAX_DIMENSION} pixels)")]
    TooLarge { width: u32, height: u32 },
    #[error("Invalid image file: {0}")]
    Undecodable(#[from] image::ImageError),
}
