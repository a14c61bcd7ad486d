use crate::error::{AppError, AppResult};
use crate::middleware::auth::ensure_active;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::upload::{UploadConfig, UploadService};
use crate::services::user::UserService;
use axum::{extract::Multipart, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Upload and set the user's profile picture.
/// POST /auth/picture (multipart form: field "file")
#[utoipa::path(
    post,
    path = "/api/v1/auth/picture",
    security(("jwt_token" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture uploaded", body = UploadResponse),
        (status = 400, description = "Invalid file", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "users"
)]
pub async fn upload_picture(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let user_id = ensure_active(&auth_user)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;

    let url = UploadService::save_avatar(&config, &data, &content_type).await?;

    let service = UserService::new(db);
    service.update_avatar_url(user_id, &url).await?;

    Ok(ApiResponse::ok(UploadResponse { url }))
}
