//! Write-once image storage for the profile and live-capture collections.

use crate::error::{ImageRejection, IngestError};
use crate::payload::{decode_base64_payload, TargetFormat};
use crate::validate::{self, DecodedImage};
use chrono::{DateTime, Utc};
use facecheck_core::{Collection, StorageLayout};
use image::{DynamicImage, ImageReader};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Metadata of an image written by the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub filename: String,
    /// Client-supplied name; only binary uploads carry one.
    pub original_filename: Option<String>,
    pub path: PathBuf,
    pub collection: Collection,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub stored_at: DateTime<Utc>,
}

/// Result of validating a payload without storing it.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub extension: String,
    pub format: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

/// Validates uploads and writes each accepted one to a fresh, uniquely
/// named file. Never overwrites or deletes.
#[derive(Debug, Clone)]
pub struct ImageStore {
    layout: StorageLayout,
    max_upload_bytes: usize,
}

impl ImageStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            max_upload_bytes: validate::MAX_UPLOAD_BYTES,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Run the binary-upload validation pipeline without writing anything.
    ///
    /// Order: filename present, extension, size, raster + dimensions.
    pub fn inspect(&self, filename: Option<&str>, bytes: &[u8]) -> Result<(String, DecodedImage), IngestError> {
        let filename = filename.filter(|n| !n.is_empty()).ok_or(IngestError::MissingFile)?;
        let extension = validate::allowed_extension(filename)?;
        validate::check_size(bytes.len(), self.max_upload_bytes)?;
        let decoded = validate::decode_image(bytes)?;
        Ok((extension, decoded))
    }

    /// Like [`inspect`](Self::inspect), summarised for display.
    pub fn describe(&self, filename: Option<&str>, bytes: &[u8]) -> Result<ImageInfo, IngestError> {
        let (extension, decoded) = self.inspect(filename, bytes)?;
        Ok(ImageInfo {
            extension,
            format: format!("{:?}", decoded.format).to_lowercase(),
            size: bytes.len(),
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    /// Validate a binary upload and write it verbatim into `collection`.
    pub fn store_file(
        &self,
        collection: Collection,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, IngestError> {
        let (extension, _decoded) = self.inspect(filename, bytes)?;

        let (name, path) = self.fresh_path(collection, &extension);
        write_new(&path, bytes)?;

        let stored = self.describe_written(collection, name, path, filename.map(str::to_string))?;
        tracing::info!(
            %collection,
            filename = %stored.filename,
            size = stored.size,
            width = stored.width,
            height = stored.height,
            "stored uploaded image"
        );
        Ok(stored)
    }

    /// Validate a base64 upload, re-encode it into the format implied by
    /// `content_type` and write it into `collection`.
    pub fn store_base64(
        &self,
        collection: Collection,
        data: &str,
        content_type: Option<&str>,
    ) -> Result<StoredImage, IngestError> {
        let bytes = decode_base64_payload(data)?;
        validate::check_size(bytes.len(), self.max_upload_bytes)?;
        let decoded = validate::decode_image(&bytes)?;

        let target = TargetFormat::from_content_type(content_type);
        let encoded = reencode(decoded.image, target)?;

        let (name, path) = self.fresh_path(collection, target.extension());
        write_new(&path, &encoded)?;

        let stored = self.describe_written(collection, name, path, None)?;
        tracing::info!(
            %collection,
            filename = %stored.filename,
            target = ?target,
            size = stored.size,
            "stored base64 image"
        );
        Ok(stored)
    }

    fn fresh_path(&self, collection: Collection, extension: &str) -> (String, PathBuf) {
        let name = format!("{}{}.{}", collection.name_prefix(), Uuid::new_v4(), extension);
        let path = self.layout.dir(collection).join(&name);
        (name, path)
    }

    /// Re-read size and dimensions from the file as written.
    fn describe_written(
        &self,
        collection: Collection,
        filename: String,
        path: PathBuf,
        original_filename: Option<String>,
    ) -> Result<StoredImage, IngestError> {
        let size = std::fs::metadata(&path)?.len();
        let (width, height) = ImageReader::open(&path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(ImageRejection::from)?;

        Ok(StoredImage {
            filename,
            original_filename,
            path,
            collection,
            size,
            width,
            height,
            stored_at: Utc::now(),
        })
    }
}

/// Normalise pixel layout for the target encoder (JPEG has no alpha).
fn reencode(image: DynamicImage, target: TargetFormat) -> Result<Vec<u8>, IngestError> {
    let normalized = match target {
        TargetFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        TargetFormat::Png if !image.color().has_alpha() => DynamicImage::ImageRgb8(image.to_rgb8()),
        TargetFormat::Png | TargetFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    normalized
        .write_to(&mut out, target.image_format())
        .map_err(ImageRejection::from)?;
    Ok(out.into_inner())
}

/// Create `path` exclusively and write `bytes`. A partially written file is removed.
fn write_new(path: &Path, bytes: &[u8]) -> Result<(), IngestError> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    drop(file);
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
        }
        return Err(e.into());
    }
    Ok(())
}
