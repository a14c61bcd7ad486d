use crate::error::AppResult;
use crate::middleware::auth::ensure_active;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::like::LikeService;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub nb_likes: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/workouts/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 404, description = "Workout not found or not visible", body = crate::error::AppError),
    ),
    tag = "likes"
)]
pub async fn like_workout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    toggle(db, hub, auth_user, "workout", id).await
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 404, description = "Comment not found or not visible", body = crate::error::AppError),
    ),
    tag = "likes"
)]
pub async fn like_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    toggle(db, hub, auth_user, "comment", id).await
}

async fn toggle(
    db: DatabaseConnection,
    hub: NotificationHub,
    auth_user: AuthUser,
    target_type: &str,
    target_id: i32,
) -> AppResult<ApiResponse<LikeToggleResponse>> {
    let user_id = ensure_active(&auth_user)?;

    let service = LikeService::new(db, hub);
    let liked = service.toggle(user_id, target_type, target_id).await?;
    let nb_likes = service.count(target_type, target_id).await?;

    Ok(ApiResponse::ok(LikeToggleResponse { liked, nb_likes }))
}
