use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ensure_active, parse_user_id};
use crate::middleware::AuthUser;
use crate::models::CommentModel;
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::like::LikeService;
use crate::services::visibility::VisibilityService;
use crate::services::workout::WorkoutService;
use crate::utils::render_markdown;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Workout to comment on
    pub workout_id: i32,
    /// Comment text (markdown, mentions with @username)
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    /// Comment visibility (private, followers_only, public)
    pub text_visibility: Option<String>,
    /// Comment to reply to (same workout)
    pub reply_to: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    /// New comment text
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    /// New comment visibility
    pub text_visibility: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub user_id: i32,
    pub workout_id: i32,
    pub text: String,
    /// Sanitized HTML rendering of the text
    pub text_html: String,
    pub text_visibility: String,
    pub reply_to: Option<i32>,
    pub suspended: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl From<CommentModel> for CommentResponse {
    fn from(comment: CommentModel) -> Self {
        let text_html = render_markdown(&comment.text);
        Self {
            id: comment.id,
            user_id: comment.user_id,
            workout_id: comment.workout_id,
            text: comment.text,
            text_html,
            text_visibility: comment.text_visibility,
            reply_to: comment.reply_to,
            suspended: comment.suspended_at.is_some(),
            created_at: comment.created_at.to_string(),
            updated_at: comment.updated_at.map(|t| t.to_string()),
            nb_likes: None,
            liked: None,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/comments",
    security(("jwt_token" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Workout not found or not visible", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;
    let text_visibility = payload
        .text_visibility
        .unwrap_or_else(|| "private".to_string());

    let service = CommentService::new(db, hub);
    let comment = service
        .create(
            user_id,
            payload.workout_id,
            &payload.text,
            &text_visibility,
            payload.reply_to,
        )
        .await?;

    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/workouts/{workout_id}/comments",
    security(("jwt_token" = [])),
    params(("workout_id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Comments visible to the requesting user", body = [CommentResponse]),
        (status = 404, description = "Workout not found or not visible", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(workout_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let workout = WorkoutService::new(db.clone()).get_by_id(workout_id).await?;
    let visibility = VisibilityService::new(db.clone());
    if !visibility
        .can_view_workout(
            user_id,
            workout.user_id,
            &workout.workout_visibility,
            workout.suspended_at.is_some(),
        )
        .await?
    {
        return Err(AppError::NotFound);
    }

    let service = CommentService::new(db.clone(), hub.clone());
    let comments = service.list_for_workout(workout_id, user_id).await?;

    let likes = LikeService::new(db, hub);
    let mut items = Vec::with_capacity(comments.len());
    for comment in comments {
        let nb_likes = likes.count("comment", comment.id).await?;
        let liked = likes.has_liked(user_id, "comment", comment.id).await?;
        let mut response = CommentResponse::from(comment);
        response.nb_likes = Some(nb_likes);
        response.liked = Some(liked);
        items.push(response);
    }

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the comment author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;

    let service = CommentService::new(db, hub);
    let comment = service
        .update(id, user_id, &payload.text, payload.text_visibility.as_deref())
        .await?;

    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the comment author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = ensure_active(&auth_user)?;

    let service = CommentService::new(db, hub);
    service.delete(id, user_id).await?;

    Ok(ApiResponse::ok("Comment deleted"))
}
