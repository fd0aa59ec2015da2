//! HTTP rendering of ingestion and comparison failures.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use facecheck_core::CompareError;
use facecheck_ingest::{ImageRejection, IngestError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error("Malformed form data: {}", .0.body_text())]
    Multipart(#[from] MultipartError),
    #[error("Malformed form data: {}", .0.body_text())]
    MultipartRejected(#[from] MultipartRejection),
    #[error("Malformed form data: {}", .0.body_text())]
    FormRejected(#[from] FormRejection),
    #[error("Field required: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Internal(String),
}

/// Failure envelope: `{"success": false, "detail": ..., "code": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub detail: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ingest(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Compare(CompareError::InvalidName { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Compare(CompareError::ImageNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Compare(CompareError::Decode { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Compare(CompareError::NoFaceDetected { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Compare(CompareError::Encoder(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(e) => e.status(),
            ApiError::MultipartRejected(e) => e.status(),
            ApiError::FormRejected(e) => e.status(),
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ingest(e) => match e {
                IngestError::MissingFile => "missing_file",
                IngestError::UnsupportedFileType { .. } => "unsupported_file_type",
                IngestError::PayloadTooLarge { .. } => "payload_too_large",
                IngestError::InvalidImage(ImageRejection::TooSmall { .. }) => "image_too_small",
                IngestError::InvalidImage(ImageRejection::TooLarge { .. }) => "image_too_large",
                IngestError::InvalidImage(ImageRejection::Undecodable(_)) => "invalid_image",
                IngestError::InvalidEncoding(_) => "invalid_encoding",
                IngestError::Io(_) => "storage_error",
            },
            ApiError::Compare(e) => match e {
                CompareError::InvalidName { .. } => "invalid_name",
                CompareError::ImageNotFound { .. } => "image_not_found",
                CompareError::Decode { .. } => "invalid_image",
                CompareError::NoFaceDetected { .. } => "no_face_detected",
                CompareError::Encoder(_) => "encoder_error",
            },
            ApiError::Multipart(_) | ApiError::MultipartRejected(_) | ApiError::FormRejected(_) => {
                if self.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "invalid_form"
                }
            }
            ApiError::MissingField(_) => "missing_field",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing text. Internal failures do not leak filesystem detail.
    fn detail(&self) -> String {
        match self {
            ApiError::Compare(CompareError::ImageNotFound { collection, .. }) => {
                format!("{collection} image not found")
            }
            ApiError::Compare(CompareError::NoFaceDetected { collection, .. }) => {
                format!("No face detected in {collection} image")
            }
            ApiError::Compare(CompareError::Decode { collection, .. }) => {
                format!("Invalid {collection} image file")
            }
            ApiError::Ingest(IngestError::Io(_)) => "Failed to store image".to_string(),
            ApiError::Compare(CompareError::Encoder(_)) => "Face recognition failed".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "request rejected");
        }

        let body = ErrorBody {
            success: false,
            detail: self.detail(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}
