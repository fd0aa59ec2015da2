//! JSON response shapes.

use chrono::{DateTime, Utc};
use facecheck_ingest::StoredImage;
use serde::Serialize;

/// Success envelope: `{"success": true, "message": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct UploadData {
    pub filename: String,
    /// Absent for text-encoded uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub file_path: String,
    pub file_size: u64,
    pub dimensions: Dimensions,
    pub upload_time: DateTime<Utc>,
    pub user_id: Option<String>,
}

impl UploadData {
    pub fn new(stored: StoredImage, user_id: Option<String>) -> Self {
        Self {
            file_path: stored.path.display().to_string(),
            filename: stored.filename,
            original_filename: stored.original_filename,
            file_size: stored.size,
            dimensions: Dimensions {
                width: stored.width,
                height: stored.height,
            },
            upload_time: stored.stored_at,
            user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecognitionData {
    pub result: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub message: &'static str,
    pub status: &'static str,
}
