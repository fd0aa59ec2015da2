//! Route handlers. Blocking decode, inference and file I/O run on the
//! blocking pool; handlers only parse the form and shape the response.

use crate::dto::{ApiResponse, RecognitionData, ServiceStatus, UploadData};
use crate::error::ApiError;
use crate::extract::{FormFields, Upload};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use facecheck_core::Collection;
use facecheck_ingest::validate::allowed_extension;
use facecheck_ingest::IngestError;

const PROFILE_FILE_FIELD: &str = "profilePhoto";
const LIVE_CAPTURE_FILE_FIELD: &str = "liveCamPhoto";
const USER_ID_FIELD: &str = "userId";

pub async fn status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        message: "Profile Picture Upload API",
        status: "running",
    })
}

pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Upload(multipart): Upload,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let data = store_upload(&state, multipart, PROFILE_FILE_FIELD, Collection::Profile).await?;
    Ok(Json(ApiResponse::ok("Profile picture uploaded successfully", data)))
}

pub async fn upload_live_cam_photo(
    State(state): State<AppState>,
    Upload(multipart): Upload,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let data = store_upload(&state, multipart, LIVE_CAPTURE_FILE_FIELD, Collection::LiveCapture).await?;
    Ok(Json(ApiResponse::ok("Live camera photo uploaded successfully", data)))
}

pub async fn upload_profile_picture_base64(
    State(state): State<AppState>,
    mut fields: FormFields,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let image_data = fields.require("imageData")?;
    let image_type = fields.take("imageType").filter(|t| !t.is_empty());
    let user_id = fields.take(USER_ID_FIELD);

    let store = state.store.clone();
    let stored = tokio::task::spawn_blocking(move || {
        store.store_base64(Collection::Profile, &image_data, image_type.as_deref())
    })
    .await??;

    Ok(Json(ApiResponse::ok(
        "Profile picture uploaded successfully",
        UploadData::new(stored, user_id),
    )))
}

pub async fn face_recognition(
    State(state): State<AppState>,
    mut fields: FormFields,
) -> Result<Json<ApiResponse<RecognitionData>>, ApiError> {
    let profile = fields.require("profilePhotoPath")?;
    let live = fields.require("liveCamPhotoPath")?;

    let comparator = state.comparator.clone();
    let comparison = tokio::task::spawn_blocking(move || comparator.compare(&profile, &live)).await??;

    Ok(Json(ApiResponse::ok(
        "Face recognition successful",
        RecognitionData {
            result: comparison.same_person,
        },
    )))
}

/// A multipart upload: one file part plus the optional user id.
#[derive(Default)]
struct UploadForm {
    filename: Option<String>,
    bytes: Option<Bytes>,
    user_id: Option<String>,
}

async fn store_upload(
    state: &AppState,
    multipart: Multipart,
    file_field: &'static str,
    collection: Collection,
) -> Result<UploadData, ApiError> {
    let form = read_upload_form(multipart, file_field).await?;
    let (Some(filename), Some(bytes)) = (form.filename, form.bytes) else {
        return Err(IngestError::MissingFile.into());
    };

    let store = state.store.clone();
    let stored = tokio::task::spawn_blocking(move || store.store_file(collection, Some(&filename), &bytes)).await??;
    Ok(UploadData::new(stored, form.user_id))
}

/// The extension is checked as soon as the file part's header arrives, so a
/// disallowed type is refused without buffering its body.
async fn read_upload_form(mut multipart: Multipart, file_field: &str) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == file_field {
            let filename = field
                .file_name()
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .ok_or(IngestError::MissingFile)?;
            allowed_extension(&filename)?;
            form.bytes = Some(field.bytes().await?);
            form.filename = Some(filename);
        } else if name == USER_ID_FIELD {
            form.user_id = Some(field.text().await?);
        }
    }

    Ok(form)
}
