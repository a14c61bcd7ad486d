use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ensure_active, parse_user_id};
use crate::middleware::AuthUser;
use crate::models::{WorkoutModel, WorkoutSegmentModel};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::cache::CacheService;
use crate::services::follow::FollowService;
use crate::services::gpx;
use crate::services::like::LikeService;
use crate::services::sport::SportService;
use crate::services::upload::{UploadConfig, UploadService};
use crate::services::visibility::{validate_visibility, VisibilityService};
use crate::services::workout::{
    NewGpxWorkout, NewWorkoutWithoutGpx, WorkoutFilters, WorkoutService, WorkoutUpdate,
};
use crate::utils::format_duration;
use crate::websocket::hub::NotificationHub;
use axum::{
    extract::{Multipart, Path, Query},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkoutSegmentResponse {
    pub segment_index: i32,
    pub duration: String,
    pub pauses: String,
    pub moving: String,
    pub distance: f64,
    pub min_alt: Option<f64>,
    pub max_alt: Option<f64>,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub max_speed: Option<f64>,
    pub ave_speed: Option<f64>,
}

impl From<WorkoutSegmentModel> for WorkoutSegmentResponse {
    fn from(segment: WorkoutSegmentModel) -> Self {
        Self {
            segment_index: segment.segment_index,
            duration: format_duration(segment.duration_seconds as i64),
            pauses: format_duration(segment.pauses_seconds as i64),
            moving: format_duration(segment.moving_seconds as i64),
            distance: segment.distance_km,
            min_alt: segment.min_alt,
            max_alt: segment.max_alt,
            ascent: segment.ascent,
            descent: segment.descent,
            max_speed: segment.max_speed,
            ave_speed: segment.ave_speed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkoutResponse {
    pub id: i32,
    pub user_id: i32,
    pub sport_id: i32,
    pub title: String,
    pub workout_date: String,
    pub duration: String,
    pub pauses: String,
    pub moving: String,
    pub distance: f64,
    pub min_alt: Option<f64>,
    pub max_alt: Option<f64>,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub max_speed: Option<f64>,
    pub ave_speed: Option<f64>,
    pub with_gpx: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<serde_json::Value>,
    /// Only serialized for the workout owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub workout_visibility: String,
    pub map_visibility: String,
    pub suspended: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<WorkoutSegmentResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_workout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_workout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl WorkoutResponse {
    fn build(workout: WorkoutModel, viewer_id: i32, can_see_map: bool) -> Self {
        let is_owner = workout.user_id == viewer_id;
        Self {
            id: workout.id,
            user_id: workout.user_id,
            sport_id: workout.sport_id,
            title: workout.title,
            workout_date: workout.workout_date.to_string(),
            duration: format_duration(workout.duration_seconds as i64),
            pauses: format_duration(workout.pauses_seconds as i64),
            moving: format_duration(workout.moving_seconds as i64),
            distance: workout.distance_km,
            min_alt: workout.min_alt,
            max_alt: workout.max_alt,
            ascent: workout.ascent,
            descent: workout.descent,
            max_speed: workout.max_speed,
            ave_speed: workout.ave_speed,
            with_gpx: workout.gpx_path.is_some(),
            map_id: if can_see_map { workout.map_id } else { None },
            bounds: if can_see_map { workout.bounds } else { None },
            notes: if is_owner { workout.notes } else { None },
            workout_visibility: workout.workout_visibility,
            map_visibility: workout.map_visibility,
            suspended: workout.suspended_at.is_some(),
            created_at: workout.created_at.to_string(),
            updated_at: workout.updated_at.map(|t| t.to_string()),
            segments: None,
            previous_workout: None,
            next_workout: None,
            nb_likes: None,
            liked: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkoutUploadData {
    pub sport_id: i32,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWorkoutWithoutGpxRequest {
    pub sport_id: i32,
    /// Workout date (YYYY-MM-DD HH:MM or RFC 3339)
    pub workout_date: String,
    /// Distance in km
    pub distance: f64,
    /// Duration in seconds
    pub duration: i32,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkoutListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
    pub distance_from: Option<f64>,
    pub distance_to: Option<f64>,
    /// Minimal moving duration (H:MM)
    pub duration_from: Option<String>,
    /// Maximal moving duration (H:MM)
    pub duration_to: Option<String>,
    pub ave_speed_from: Option<f64>,
    pub ave_speed_to: Option<f64>,
    pub max_speed_from: Option<f64>,
    pub max_speed_to: Option<f64>,
    pub sport_id: Option<i32>,
    /// Sorting order on workout date: asc or desc (default)
    pub order: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkoutRequest {
    pub sport_id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub notes: Option<String>,
    pub workout_visibility: Option<String>,
    pub map_visibility: Option<String>,
    pub workout_date: Option<String>,
    pub distance: Option<f64>,
    pub duration: Option<i32>,
}

fn parse_workout_date(raw: &str) -> AppResult<chrono::NaiveDateTime> {
    if let Ok(date_time) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(date_time);
    }
    if let Ok(date_time) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(date_time);
    }
    if let Ok(date_time) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(date_time.naive_utc());
    }
    Err(AppError::Validation(
        "workout_date must be 'YYYY-MM-DD HH:MM' or RFC 3339".to_string(),
    ))
}

fn parse_date(raw: &str, field: &str) -> AppResult<chrono::NaiveDate> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("{} must be in YYYY-MM-DD format", field)))
}

async fn invalidate_stats(cache: &Option<Extension<CacheService>>, user_id: i32) {
    if let Some(Extension(cache)) = cache {
        cache.invalidate_user_stats(user_id).await;
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/workouts",
    security(("jwt_token" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Workout created from gpx file", body = WorkoutResponse),
        (status = 400, description = "Invalid gpx file or payload", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn create_workout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let user_id = ensure_active(&auth_user)?;

    let mut file_bytes: Option<axum::body::Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut data: Option<WorkoutUploadData> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file data: {}", e))
                })?);
            }
            Some("data") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read form data: {}", e))
                })?;
                data = Some(
                    serde_json::from_str(&raw)
                        .map_err(|_| AppError::Validation("Invalid payload".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    let data = data.ok_or_else(|| AppError::Validation("Invalid payload".to_string()))?;

    if let Some(visibility) = &data.workout_visibility {
        validate_visibility(visibility)?;
    }
    if let Some(visibility) = &data.map_visibility {
        validate_visibility(visibility)?;
    }

    let files_config = crate::config::workouts::WorkoutFilesConfig::from_env();
    if file_bytes.len() > files_config.max_gpx_size {
        return Err(AppError::FileTooLarge);
    }

    let content = std::str::from_utf8(&file_bytes)
        .map_err(|_| AppError::Validation("Invalid gpx file: not valid UTF-8".to_string()))?;

    // Parse before touching the disk; the sport's threshold drives moving time.
    let sport = SportService::new(db.clone())
        .get_active_by_id(data.sport_id)
        .await?;
    let gpx_data = gpx::process_gpx(content, sport.stopped_speed_threshold)?;

    let gpx_path = UploadService::save_gpx(
        &upload_config,
        user_id,
        file_name.as_deref(),
        &file_bytes,
        files_config.max_gpx_size,
    )
    .await?;

    let service = WorkoutService::new(db);
    let workout = match service
        .create_with_gpx(
            user_id,
            NewGpxWorkout {
                sport_id: data.sport_id,
                title: data.title,
                notes: data.notes,
                workout_visibility: data.workout_visibility,
                map_visibility: data.map_visibility,
            },
            gpx_data,
            gpx_path.clone(),
        )
        .await
    {
        Ok(workout) => workout,
        Err(e) => {
            UploadService::delete_file(&upload_config, &gpx_path).await;
            return Err(e);
        }
    };

    invalidate_stats(&cache, user_id).await;

    Ok(ApiResponse::ok(WorkoutResponse::build(
        workout, user_id, true,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/workouts/no_gpx",
    security(("jwt_token" = [])),
    request_body = CreateWorkoutWithoutGpxRequest,
    responses(
        (status = 200, description = "Workout created", body = WorkoutResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn create_workout_no_gpx(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Json(payload): Json<CreateWorkoutWithoutGpxRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;

    if let Some(visibility) = &payload.workout_visibility {
        validate_visibility(visibility)?;
    }
    if let Some(visibility) = &payload.map_visibility {
        validate_visibility(visibility)?;
    }

    let workout_date = parse_workout_date(&payload.workout_date)?;

    let service = WorkoutService::new(db);
    let workout = service
        .create_without_gpx(
            user_id,
            NewWorkoutWithoutGpx {
                sport_id: payload.sport_id,
                workout_date,
                distance_km: payload.distance,
                duration_seconds: payload.duration,
                title: payload.title,
                notes: payload.notes,
                workout_visibility: payload.workout_visibility,
                map_visibility: payload.map_visibility,
            },
        )
        .await?;

    invalidate_stats(&cache, user_id).await;

    Ok(ApiResponse::ok(WorkoutResponse::build(
        workout, user_id, true,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/workouts",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
        ("from" = Option<String>, Query, description = "Start date (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "End date (YYYY-MM-DD)"),
        ("sport_id" = Option<i32>, Query, description = "Sport ID"),
        ("order" = Option<String>, Query, description = "Sort order on workout date (asc/desc)"),
    ),
    responses(
        (status = 200, description = "User workouts", body = PaginatedResponse<WorkoutResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn list_workouts(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<WorkoutListQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(5).min(100);

    let filters = WorkoutFilters {
        from: params.from.as_deref().map(|d| parse_date(d, "from")).transpose()?,
        to: params.to.as_deref().map(|d| parse_date(d, "to")).transpose()?,
        distance_from: params.distance_from,
        distance_to: params.distance_to,
        duration_from: params
            .duration_from
            .as_deref()
            .map(|d| {
                crate::utils::duration::parse_duration(d).ok_or_else(|| {
                    AppError::Validation("duration_from must be in H:MM format".to_string())
                })
            })
            .transpose()?,
        duration_to: params
            .duration_to
            .as_deref()
            .map(|d| {
                crate::utils::duration::parse_duration(d).ok_or_else(|| {
                    AppError::Validation("duration_to must be in H:MM format".to_string())
                })
            })
            .transpose()?,
        ave_speed_from: params.ave_speed_from,
        ave_speed_to: params.ave_speed_to,
        max_speed_from: params.max_speed_from,
        max_speed_to: params.max_speed_to,
        sport_id: params.sport_id,
        ascending: params.order.as_deref() == Some("asc"),
    };

    let service = WorkoutService::new(db);
    let (workouts, total) = service.list(user_id, &filters, page, per_page).await?;
    let items: Vec<WorkoutResponse> = workouts
        .into_iter()
        .map(|w| WorkoutResponse::build(w, user_id, true))
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/timeline",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Timeline of own and followed users' workouts", body = PaginatedResponse<WorkoutResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn timeline(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Query(params): Query<crate::response::PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(5).min(100);

    let following_ids = FollowService::new(db.clone(), hub).following_ids(user_id).await?;

    let service = WorkoutService::new(db);
    let (workouts, total) = service
        .timeline(user_id, following_ids, page, per_page)
        .await?;
    let items: Vec<WorkoutResponse> = workouts
        .into_iter()
        .map(|w| {
            let can_see_map = w.user_id == user_id;
            WorkoutResponse::build(w, user_id, can_see_map)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/workouts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Workout detail", body = WorkoutResponse),
        (status = 404, description = "Workout not found or not visible", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn get_workout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = WorkoutService::new(db.clone());
    let workout = service.get_by_id(id).await?;

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

    let can_see_map = visibility
        .can_view_workout(
            user_id,
            workout.user_id,
            &workout.map_visibility,
            workout.suspended_at.is_some(),
        )
        .await?;

    let segments = service.segments_for(workout.id).await?;
    let (previous, next) = service.neighbors(&workout).await?;

    let likes = LikeService::new(db, hub);
    let nb_likes = likes.count("workout", workout.id).await?;
    let liked = likes.has_liked(user_id, "workout", workout.id).await?;

    let mut response = WorkoutResponse::build(workout, user_id, can_see_map);
    response.segments = Some(
        segments
            .into_iter()
            .map(WorkoutSegmentResponse::from)
            .collect(),
    );
    response.previous_workout = previous;
    response.next_workout = next;
    response.nb_likes = Some(nb_likes);
    response.liked = Some(liked);

    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/workouts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    request_body = UpdateWorkoutRequest,
    responses(
        (status = 200, description = "Workout updated", body = WorkoutResponse),
        (status = 403, description = "Not the workout owner", body = AppError),
        (status = 404, description = "Workout not found", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn update_workout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateWorkoutRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;

    if let Some(visibility) = &payload.workout_visibility {
        validate_visibility(visibility)?;
    }
    if let Some(visibility) = &payload.map_visibility {
        validate_visibility(visibility)?;
    }

    let workout_date = payload
        .workout_date
        .as_deref()
        .map(parse_workout_date)
        .transpose()?;

    let service = WorkoutService::new(db);
    let existing = service.get_by_id(id).await?;

    // Changing sport on a GPX workout recomputes moving time with the new
    // sport's threshold, which needs the file content.
    let mut gpx_content: Option<String> = None;
    if let (Some(new_sport_id), Some(gpx_path)) = (payload.sport_id, existing.gpx_path.as_deref()) {
        if new_sport_id != existing.sport_id {
            let bytes = UploadService::read_file(&upload_config, gpx_path).await?;
            gpx_content = Some(String::from_utf8(bytes).map_err(|_| {
                AppError::Internal(anyhow::anyhow!("Stored gpx file is not valid UTF-8"))
            })?);
        }
    }

    let workout = service
        .update(
            id,
            user_id,
            WorkoutUpdate {
                sport_id: payload.sport_id,
                title: payload.title,
                notes: payload.notes,
                workout_visibility: payload.workout_visibility,
                map_visibility: payload.map_visibility,
                workout_date,
                distance_km: payload.distance,
                duration_seconds: payload.duration,
            },
            gpx_content.as_deref(),
        )
        .await?;

    invalidate_stats(&cache, user_id).await;

    Ok(ApiResponse::ok(WorkoutResponse::build(
        workout, user_id, true,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/workouts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Workout deleted", body = String),
        (status = 403, description = "Not the workout owner", body = AppError),
        (status = 404, description = "Workout not found", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn delete_workout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = ensure_active(&auth_user)?;

    let service = WorkoutService::new(db);
    let deleted = service.delete(id, user_id).await?;

    if let Some(gpx_path) = &deleted.gpx_path {
        UploadService::delete_file(&upload_config, gpx_path).await;
    }
    if let Some(map_path) = &deleted.map_path {
        UploadService::delete_file(&upload_config, map_path).await;
    }

    invalidate_stats(&cache, user_id).await;

    Ok(ApiResponse::ok("Workout deleted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/workouts/{id}/gpx",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Raw gpx content", body = serde_json::Value),
        (status = 400, description = "Workout has no gpx file", body = AppError),
        (status = 404, description = "Workout not found or not visible", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn get_workout_gpx(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (_, content) = load_gpx_for_viewer(&db, &upload_config, &auth_user, id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "gpx": content })))
}

#[utoipa::path(
    get,
    path = "/api/v1/workouts/{id}/chart_data",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Workout ID")),
    responses(
        (status = 200, description = "Chart series from the gpx file", body = serde_json::Value),
        (status = 400, description = "Workout has no gpx file", body = AppError),
        (status = 404, description = "Workout not found or not visible", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn get_workout_chart_data(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (_, content) = load_gpx_for_viewer(&db, &upload_config, &auth_user, id).await?;
    let chart = gpx::chart_data(&content)?;
    Ok(ApiResponse::ok(serde_json::json!({ "chart_data": chart })))
}

/// Serve a workout's static map image. Map ids are unguessable, the route
/// is public (map tiles are embedded in shared pages).
#[utoipa::path(
    get,
    path = "/api/v1/workouts/map/{map_id}",
    params(("map_id" = String, Path, description = "Map ID")),
    responses(
        (status = 200, description = "Map image"),
        (status = 404, description = "Map not found", body = AppError),
    ),
    tag = "workouts"
)]
pub async fn get_workout_map(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    Path(map_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = WorkoutService::new(db);
    let workout = service.get_by_map_id(&map_id).await?;

    let map_path = workout.map_path.ok_or(AppError::NotFound)?;
    let bytes = UploadService::read_file(&upload_config, &map_path)
        .await
        .map_err(|_| AppError::NotFound)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// Fetch a workout, check GPX access (gated by map visibility) and read the
/// file content.
async fn load_gpx_for_viewer(
    db: &DatabaseConnection,
    upload_config: &UploadConfig,
    auth_user: &AuthUser,
    workout_id: i32,
) -> AppResult<(WorkoutModel, String)> {
    let user_id = parse_user_id(auth_user)?;

    let service = WorkoutService::new(db.clone());
    let workout = service.get_by_id(workout_id).await?;

    let visibility = VisibilityService::new(db.clone());
    if !visibility
        .can_view_workout(
            user_id,
            workout.user_id,
            &workout.map_visibility,
            workout.suspended_at.is_some(),
        )
        .await?
    {
        return Err(AppError::NotFound);
    }

    let gpx_path = workout.gpx_path.clone().ok_or_else(|| {
        AppError::Validation(format!("No gpx file for this workout (id: {})", workout_id))
    })?;

    let bytes = UploadService::read_file(upload_config, &gpx_path).await?;
    let content = String::from_utf8(bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Stored gpx file is not valid UTF-8")))?;

    Ok((workout, content))
}
