use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::{Comment, Report, UserModel, Workout};
use crate::models::{report, User};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::upload::{UploadConfig, UploadService};
use crate::services::user::UserService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub users: u64,
    pub workouts: u64,
    pub comments: u64,
    pub pending_reports: u64,
    /// Total size of uploaded files in bytes
    pub uploads_dir_size: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub suspended_at: Option<String>,
    pub created_at: String,
}

impl From<UserModel> for AdminUserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            email_verified: user.email_verified,
            suspended_at: user.suspended_at.map(|t| t.to_string()),
            created_at: user.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminUsersQuery {
    /// Username substring filter
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// New role (user or admin)
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Instance statistics", body = StatsResponse),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let users = User::find().count(&db).await?;
    let workouts = Workout::find().count(&db).await?;
    let comments = Comment::find().count(&db).await?;
    let pending_reports = Report::find()
        .filter(report::Column::Resolved.eq(false))
        .count(&db)
        .await?;
    let uploads_dir_size = UploadService::dir_size(&upload_config).await;

    Ok(ApiResponse::ok(StatsResponse {
        users,
        workouts,
        comments,
        pending_reports,
        uploads_dir_size,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("q" = Option<String>, Query, description = "Username substring filter"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Users", body = PaginatedResponse<AdminUserResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<AdminUsersQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = UserService::new(db);
    let (users, total) = service
        .list_users(params.q.as_deref(), page, per_page)
        .await?;
    let items: Vec<AdminUserResponse> =
        users.into_iter().map(AdminUserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = AdminUserResponse),
        (status = 400, description = "Invalid role", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&db, &auth_user).await?;

    if admin_id == id {
        return Err(AppError::Validation(
            "Admins cannot change their own role".to_string(),
        ));
    }

    let service = UserService::new(db);
    let user = service.update_role(id, &payload.role).await?;
    Ok(ApiResponse::ok(AdminUserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/activate",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account activated", body = AdminUserResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn activate_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let service = UserService::new(db);
    let user = service.activate_user(id).await?;
    Ok(ApiResponse::ok(AdminUserResponse::from(user)))
}
