use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::SportModel;
use crate::response::ApiResponse;
use crate::services::sport::SportService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SportResponse {
    pub id: i32,
    pub label: String,
    pub is_active: bool,
    pub stopped_speed_threshold: f64,
}

impl From<SportModel> for SportResponse {
    fn from(sport: SportModel) -> Self {
        Self {
            id: sport.id,
            label: sport.label,
            is_active: sport.is_active,
            stopped_speed_threshold: sport.stopped_speed_threshold,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSportRequest {
    /// Enable or disable the sport
    pub is_active: Option<bool>,
    /// Speed (km/h) below which time counts as stopped
    pub stopped_speed_threshold: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/sports",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "List of sports", body = [SportResponse]),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "sports"
)]
pub async fn list_sports(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = SportService::new(db);
    let sports = service.list().await?;
    let items: Vec<SportResponse> = sports.into_iter().map(SportResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/sports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Sport ID")),
    responses(
        (status = 200, description = "Sport", body = SportResponse),
        (status = 404, description = "Sport not found", body = AppError),
    ),
    tag = "sports"
)]
pub async fn get_sport(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = SportService::new(db);
    let sport = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(SportResponse::from(sport)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/sports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Sport ID")),
    request_body = UpdateSportRequest,
    responses(
        (status = 200, description = "Sport updated", body = SportResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Sport not found", body = AppError),
    ),
    tag = "sports"
)]
pub async fn update_sport(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSportRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let service = SportService::new(db);
    let sport = service
        .update(id, payload.is_active, payload.stopped_speed_threshold)
        .await?;
    Ok(ApiResponse::ok(SportResponse::from(sport)))
}
