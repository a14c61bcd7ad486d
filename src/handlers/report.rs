use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ensure_active, parse_user_id, require_admin};
use crate::middleware::AuthUser;
use crate::models::{AdminActionModel, ReportCommentModel, ReportModel, User};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::moderation::ModerationService;
use crate::services::report::ReportService;
use crate::services::email::EmailService;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// Reported object type (comment, user or workout)
    #[validate(length(min = 1, max = 20))]
    pub object_type: String,
    /// Reported object ID
    pub object_id: i32,
    /// Reporter's note
    #[validate(length(min = 1, max = 5000))]
    pub note: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Filter by object type
    pub object_type: Option<String>,
    /// Filter by resolution state
    pub resolved: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    /// Comment to append to the admin thread
    pub comment: Option<String>,
    /// New resolution state
    pub resolved: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateActionRequest {
    /// Moderation action type (e.g. user_suspension, workout_suspension)
    #[validate(length(min = 1, max = 50))]
    pub action_type: String,
    /// Reason communicated to the affected user
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportCommentResponse {
    pub id: i32,
    pub report_id: i32,
    pub user_id: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<ReportCommentModel> for ReportCommentResponse {
    fn from(c: ReportCommentModel) -> Self {
        Self {
            id: c.id,
            report_id: c.report_id,
            user_id: c.user_id,
            comment: c.comment,
            created_at: c.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminActionResponse {
    pub id: i32,
    pub report_id: Option<i32>,
    pub admin_id: i32,
    pub user_id: Option<i32>,
    pub workout_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub action_type: String,
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<AdminActionModel> for AdminActionResponse {
    fn from(a: AdminActionModel) -> Self {
        Self {
            id: a.id,
            report_id: a.report_id,
            admin_id: a.admin_id,
            user_id: a.user_id,
            workout_id: a.workout_id,
            comment_id: a.comment_id,
            action_type: a.action_type,
            reason: a.reason,
            created_at: a.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub reported_by: i32,
    pub object_type: String,
    pub reported_comment_id: Option<i32>,
    pub reported_user_id: Option<i32>,
    pub reported_workout_id: Option<i32>,
    pub note: String,
    pub resolved: bool,
    pub resolved_at: Option<String>,
    pub created_at: String,
    /// Admin-only fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<ReportCommentResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_actions: Option<Vec<AdminActionResponse>>,
}

impl ReportResponse {
    fn build(report: ReportModel, for_admin: bool) -> Self {
        Self {
            id: report.id,
            reported_by: report.reported_by,
            object_type: report.object_type,
            reported_comment_id: report.reported_comment_id,
            reported_user_id: report.reported_user_id,
            reported_workout_id: report.reported_workout_id,
            note: report.note,
            resolved: report.resolved,
            resolved_at: report.resolved_at.map(|t| t.to_string()),
            created_at: report.created_at.to_string(),
            resolved_by: if for_admin { report.resolved_by } else { None },
            updated_at: if for_admin {
                report.updated_at.map(|t| t.to_string())
            } else {
                None
            },
            comments: None,
            admin_actions: None,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report created", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Reported object not found", body = AppError),
        (status = 409, description = "Report already exists", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;

    let service = ReportService::new(db, hub);
    let report = service
        .create(
            user_id,
            &payload.object_type,
            payload.object_id,
            &payload.note,
        )
        .await?;

    Ok(ApiResponse::ok(ReportResponse::build(report, false)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    params(
        ("object_type" = Option<String>, Query, description = "Filter by object type (admin)"),
        ("resolved" = Option<bool>, Query, description = "Filter by resolution state (admin)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reports: all for admins, own for regular users", body = PaginatedResponse<ReportResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let is_admin = is_admin(&db, user_id).await?;

    let service = ReportService::new(db, hub);
    let (reports, total) = if is_admin {
        service
            .list_for_admin(
                params.object_type.as_deref(),
                params.resolved,
                page,
                per_page,
            )
            .await?
    } else {
        service.list_for_reporter(user_id, page, per_page).await?
    };

    let items: Vec<ReportResponse> = reports
        .into_iter()
        .map(|r| ReportResponse::build(r, is_admin))
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report detail", body = ReportResponse),
        (status = 403, description = "Not the reporter nor an admin", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn get_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let is_admin = is_admin(&db, user_id).await?;

    let service = ReportService::new(db, hub);
    let report = service.get_for_user(id, user_id, is_admin).await?;

    let mut response = ReportResponse::build(report, is_admin);
    if is_admin {
        let comments = service.comments_for(id).await?;
        let actions = service.actions_for(id).await?;
        response.comments = Some(
            comments
                .into_iter()
                .map(ReportCommentResponse::from)
                .collect(),
        );
        response.admin_actions =
            Some(actions.into_iter().map(AdminActionResponse::from).collect());
    }

    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReportRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&db, &auth_user).await?;

    let service = ReportService::new(db, hub);
    let report = service
        .update(id, admin_id, payload.comment.as_deref(), payload.resolved)
        .await?;

    Ok(ApiResponse::ok(ReportResponse::build(report, true)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports/{id}/actions",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = CreateActionRequest,
    responses(
        (status = 200, description = "Moderation action taken", body = AdminActionResponse),
        (status = 400, description = "Invalid action for this report", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Duplicate warning", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report_action(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateActionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let admin_id = require_admin(&db, &auth_user).await?;

    let service = ModerationService::new(db, hub, email_service);
    let action = service
        .create_action(admin_id, id, &payload.action_type, payload.reason.as_deref())
        .await?;

    Ok(ApiResponse::ok(AdminActionResponse::from(action)))
}

async fn is_admin(db: &DatabaseConnection, user_id: i32) -> AppResult<bool> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(user.is_admin())
}
