//! Upload validation: extension allow-list, size cap, raster and dimension checks.

use crate::error::{ImageRejection, IngestError};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Accepted file extensions (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
/// Upload size cap in bytes (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const MIN_DIMENSION: u32 = 50;
pub const MAX_DIMENSION: u32 = 5000;

/// Lowercased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Result<String, IngestError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

    ext.ok_or_else(|| IngestError::UnsupportedFileType {
        filename: filename.to_string(),
    })
}

pub fn check_size(size: usize, max: usize) -> Result<(), IngestError> {
    if size > max {
        return Err(IngestError::PayloadTooLarge { size, max });
    }
    Ok(())
}

/// Both axes must lie in `[MIN_DIMENSION, MAX_DIMENSION]`.
pub fn check_dimensions(width: u32, height: u32) -> Result<(), ImageRejection> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(ImageRejection::TooSmall { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImageRejection::TooLarge { width, height });
    }
    Ok(())
}

/// A payload that passed raster validation.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode `bytes` as a raster image within the dimension bounds.
///
/// Dimensions are read from the header first so oversized images are
/// refused before any pixel buffer is allocated.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, ImageRejection> {
    let format = image::guess_format(bytes)?;
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    check_dimensions(width, height)?;

    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok(DecodedImage { image, format })
}
