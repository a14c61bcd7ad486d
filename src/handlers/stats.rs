use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::{RecordModel, User};
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::record::RecordService;
use crate::services::stats::{StatsService, TimeFrame};
use crate::utils::format_duration;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse {
    pub id: i32,
    pub sport_id: i32,
    pub workout_id: i32,
    pub record_type: String,
    /// Formatted value: speed/distance as number, duration as H:MM:SS
    pub value: serde_json::Value,
    pub workout_date: String,
}

impl From<RecordModel> for RecordResponse {
    fn from(record: RecordModel) -> Self {
        let value = if record.record_type == "LD" {
            serde_json::json!(format_duration(record.value as i64))
        } else {
            serde_json::json!(record.value)
        };
        Self {
            id: record.id,
            sport_id: record.sport_id,
            workout_id: record.workout_id,
            record_type: record.record_type,
            value,
            workout_date: record.workout_date.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatsByTimeQuery {
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Bucket size: week, month or year (default: month)
    pub time: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/records",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "User records per sport", body = [RecordResponse]),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "stats"
)]
pub async fn get_records(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = RecordService::new(db);
    let records = service.list_for_user(user_id).await?;
    let items: Vec<RecordResponse> = records.into_iter().map(RecordResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/{username}/by-sport",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Totals per sport", body = serde_json::Value),
        (status = 403, description = "Not the user nor an admin", body = AppError),
    ),
    tag = "stats"
)]
pub async fn stats_by_sport(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let target_id = check_stats_access(&db, &auth_user, &username).await?;

    let service = StatsService::new(db, cache.map(|Extension(c)| c));
    let stats = service.by_sport(target_id).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "statistics": stats }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/{username}/by-time",
    security(("jwt_token" = [])),
    params(
        ("username" = String, Path, description = "Username"),
        ("from" = Option<String>, Query, description = "Start date (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "End date (YYYY-MM-DD)"),
        ("time" = Option<String>, Query, description = "Bucket size: week, month, year"),
    ),
    responses(
        (status = 200, description = "Totals per time bucket and sport", body = serde_json::Value),
        (status = 403, description = "Not the user nor an admin", body = AppError),
    ),
    tag = "stats"
)]
pub async fn stats_by_time(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(username): Path<String>,
    Query(params): Query<StatsByTimeQuery>,
) -> AppResult<impl IntoResponse> {
    let target_id = check_stats_access(&db, &auth_user, &username).await?;

    let frame = match params.time.as_deref() {
        Some(raw) => TimeFrame::parse(raw)?,
        None => TimeFrame::Month,
    };
    let from = params
        .from
        .as_deref()
        .map(|d| {
            d.parse()
                .map_err(|_| AppError::Validation("from must be in YYYY-MM-DD format".to_string()))
        })
        .transpose()?;
    let to = params
        .to
        .as_deref()
        .map(|d| {
            d.parse()
                .map_err(|_| AppError::Validation("to must be in YYYY-MM-DD format".to_string()))
        })
        .transpose()?;

    let service = StatsService::new(db, cache.map(|Extension(c)| c));
    let stats = service.by_time(target_id, from, to, frame).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "statistics": stats }),
    ))
}

/// Statistics are visible to the user themselves and to admins.
async fn check_stats_access(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    username: &str,
) -> AppResult<i32> {
    let viewer_id = parse_user_id(auth_user)?;

    let target = crate::services::user::UserService::new(db.clone())
        .get_by_username(username)
        .await?;

    if target.id == viewer_id {
        return Ok(target.id);
    }

    let viewer = User::find_by_id(viewer_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !viewer.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(target.id)
}
