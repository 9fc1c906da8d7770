//! HTTP routes for the avatar image API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use log::{error, info, warn};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::server::ServerCore;
use crate::avatar::{AvatarError, AvatarProfile};
use crate::common::config::WebConfig;
use crate::processing::lsb::{BITS_PER_CHAR, MARKER_BITS};
use crate::processing::steganography::StegoError;

#[derive(Serialize)]
struct EmbedResponse {
    success: bool,
    message: String,
    carrier_image_base64: String,
}

#[derive(Serialize)]
struct ExtractResponse {
    profile: AvatarProfile,
}

#[derive(Serialize)]
struct CapacityResponse {
    capacity_bits: usize,
    max_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub struct AppState {
    pub core: ServerCore,
}

/// Build the application router.
pub fn router(config: &WebConfig) -> Router {
    let state = Arc::new(AppState {
        core: ServerCore::new(),
    });

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/avatar/embed", post(embed_handler))
        .route("/api/avatar/extract", post(extract_handler))
        .route("/api/capacity", post(capacity_handler))
        .with_state(state);

    let app = match &config.server.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(DefaultBodyLimit::max(config.limits.max_upload_bytes))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "avatar-stego",
        "encoding": "red-channel-lsb",
        "output_format": "png"
    }))
}

async fn embed_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let request_id = rand::random::<u64>();

    info!(
        "📤 Request #{} received {} ({} bytes)",
        request_id,
        form.filename,
        form.image.len()
    );

    let profile = form.profile()?;
    let filename = form.filename;

    let carrier = state
        .core
        .embed_profile(request_id, form.image, profile)
        .await
        .map_err(|e| core_error(request_id, e))?;

    Ok((
        StatusCode::OK,
        Json(EmbedResponse {
            success: true,
            message: format!("Embedded avatar into {}", filename),
            carrier_image_base64: general_purpose::STANDARD.encode(&carrier),
        }),
    ))
}

async fn extract_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let request_id = rand::random::<u64>();

    match state.core.extract_profile(request_id, form.image).await {
        Ok(Some(profile)) => Ok((StatusCode::OK, Json(ExtractResponse { profile }))),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "no avatar data found in image")),
        Err(e) => Err(core_error(request_id, e)),
    }
}

async fn capacity_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = UploadForm::read(multipart).await?;

    let capacity_bits = state
        .core
        .capacity(form.image)
        .await
        .map_err(|e| core_error(0, e))?;

    Ok(Json(CapacityResponse {
        capacity_bits,
        max_chars: capacity_bits.saturating_sub(MARKER_BITS) / BITS_PER_CHAR,
    }))
}

/// Fields collected from a multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    image: Vec<u8>,
    filename: String,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut image = None;
        let mut form = UploadForm {
            filename: String::from("uploaded_image"),
            ..Default::default()
        };

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            api_error(e.status(), format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                if let Some(file_name) = field.file_name() {
                    form.filename = file_name.to_string();
                }
                let data = field.bytes().await.map_err(|e| {
                    api_error(e.status(), format!("Failed to read image data: {}", e))
                })?;
                image = Some(data.to_vec());
            } else {
                let value = field.text().await.map_err(|e| {
                    api_error(e.status(), format!("Failed to read field '{}': {}", name, e))
                })?;
                form.fields.insert(name, value);
            }
        }

        form.image = image.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No image provided"))?;
        Ok(form)
    }

    fn profile(&self) -> Result<AvatarProfile, ApiError> {
        profile_from_fields(&self.fields)
    }
}

fn profile_from_fields(fields: &HashMap<String, String>) -> Result<AvatarProfile, ApiError> {
    let field = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    let name = field("name");
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }

    Ok(AvatarProfile {
        name,
        personality: field("personality"),
        background_knowledge: field("backgroundKnowledge"),
        voice_model: field("voiceModel"),
    })
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a [`ServerCore`] failure to a status code and user-facing message.
fn core_error(request_id: u64, err: anyhow::Error) -> ApiError {
    let Some(avatar_err) = err.downcast_ref::<AvatarError>() else {
        error!("❌ Request #{} failed: {}", request_id, err);
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    };

    warn!("Request #{} rejected: {}", request_id, avatar_err);
    api_error(status_for(avatar_err), avatar_err.user_message())
}

fn status_for(err: &AvatarError) -> StatusCode {
    match err {
        _ if err.is_capacity() => StatusCode::PAYLOAD_TOO_LARGE,
        AvatarError::MalformedPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AvatarError::Stego(StegoError::Image(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
