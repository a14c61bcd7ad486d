use crate::error::{AppError, AppResult};
use crate::handlers::report::AdminActionResponse;
use crate::middleware::auth::{parse_user_id, require_admin};
use crate::middleware::AuthUser;
use crate::models::AppealModel;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::email::EmailService;
use crate::services::moderation::ModerationService;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AppealRequest {
    /// Appeal text
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListAppealsQuery {
    /// Only return unprocessed appeals
    pub pending: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessAppealRequest {
    /// Approve (lifts the sanction) or reject
    pub approved: bool,
    /// Reason communicated to the appealing user
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppealResponse {
    pub id: i32,
    pub action_id: i32,
    pub user_id: i32,
    pub text: String,
    /// NULL while pending
    pub approved: Option<bool>,
    pub reason: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<AppealModel> for AppealResponse {
    fn from(appeal: AppealModel) -> Self {
        Self {
            id: appeal.id,
            action_id: appeal.action_id,
            user_id: appeal.user_id,
            text: appeal.text,
            approved: appeal.approved,
            reason: appeal.reason,
            created_at: appeal.created_at.to_string(),
            updated_at: appeal.updated_at.map(|t| t.to_string()),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/account/suspension",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Latest account suspension with its appeal", body = serde_json::Value),
        (status = 404, description = "Account has never been suspended", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn get_account_suspension(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    // Intentionally allowed while suspended.
    let user_id = parse_user_id(&auth_user)?;

    let service = ModerationService::new(db, hub, email_service);
    let (action, appeal) = service.latest_account_suspension(user_id).await?;

    Ok(ApiResponse::ok(serde_json::json!({
        "action": AdminActionResponse::from(action),
        "appeal": appeal.map(AppealResponse::from),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/account/suspension/appeal",
    security(("jwt_token" = [])),
    request_body = AppealRequest,
    responses(
        (status = 200, description = "Appeal created", body = AppealResponse),
        (status = 400, description = "Account is not suspended", body = AppError),
        (status = 409, description = "Appeal already exists", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn appeal_account_suspension(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Json(payload): Json<AppealRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Intentionally allowed while suspended.
    let user_id = parse_user_id(&auth_user)?;

    let service = ModerationService::new(db, hub, email_service);
    let appeal = service
        .appeal_account_suspension(user_id, &payload.text)
        .await?;

    Ok(ApiResponse::ok(AppealResponse::from(appeal)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin-actions/{id}/appeal",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Admin action ID")),
    request_body = AppealRequest,
    responses(
        (status = 200, description = "Appeal created", body = AppealResponse),
        (status = 400, description = "Action cannot be appealed", body = AppError),
        (status = 403, description = "Not the affected user", body = AppError),
        (status = 409, description = "Appeal already exists", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn appeal_action(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AppealRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Intentionally allowed while suspended.
    let user_id = parse_user_id(&auth_user)?;

    let service = ModerationService::new(db, hub, email_service);
    let appeal = service.appeal(user_id, id, &payload.text).await?;

    Ok(ApiResponse::ok(AppealResponse::from(appeal)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/appeals",
    security(("jwt_token" = [])),
    params(
        ("pending" = Option<bool>, Query, description = "Only unprocessed appeals"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Appeals", body = PaginatedResponse<AppealResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn list_appeals(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Query(params): Query<ListAppealsQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = ModerationService::new(db, hub, email_service);
    let (appeals, total) = service
        .list_appeals(params.pending.unwrap_or(false), page, per_page)
        .await?;
    let items: Vec<AppealResponse> = appeals.into_iter().map(AppealResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/appeals/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Appeal ID")),
    request_body = ProcessAppealRequest,
    responses(
        (status = 200, description = "Appeal processed", body = AppealResponse),
        (status = 400, description = "Appeal already processed", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "moderation"
)]
pub async fn process_appeal(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ProcessAppealRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&db, &auth_user).await?;

    let service = ModerationService::new(db, hub, email_service);
    let appeal = service
        .process_appeal(id, admin_id, payload.approved, payload.reason.as_deref())
        .await?;

    Ok(ApiResponse::ok(AppealResponse::from(appeal)))
}
