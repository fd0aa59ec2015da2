use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Multipart framing on top of the largest accepted payload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    // Oversize uploads must reach the validator to get the structured error,
    // and base64 inflates by a third.
    let body_limit = state.store.max_upload_bytes() * 2 + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handlers::status))
        .route("/upload-profile-picture", post(handlers::upload_profile_picture))
        .route(
            "/upload-profile-picture-base64",
            post(handlers::upload_profile_picture_base64),
        )
        .route("/upload-live-cam-photo", post(handlers::upload_live_cam_photo))
        .route("/face-recognition", post(handlers::face_recognition))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS from the configured allow-list. `*` allows any origin, which rules
/// out credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
