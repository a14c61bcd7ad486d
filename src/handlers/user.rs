use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ensure_active, parse_user_id};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::follow::FollowService;
use crate::services::user::{ProfileUpdate, UserService};
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i32,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    /// Member since
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_following: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_workouts: Option<u64>,
    /// Whether the requesting user follows this user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed_by_me: Option<bool>,
}

impl From<UserModel> for UserProfileResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            location: user.location,
            avatar_url: user.avatar_url,
            created_at: user.created_at.to_string(),
            nb_followers: None,
            nb_following: None,
            nb_workouts: None,
            is_followed_by_me: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    /// First name
    #[validate(length(max = 80))]
    pub first_name: Option<String>,
    /// Last name
    #[validate(length(max = 80))]
    pub last_name: Option<String>,
    /// Bio (max 200 characters)
    #[validate(length(max = 200))]
    pub bio: Option<String>,
    /// Location
    #[validate(length(max = 80))]
    pub location: Option<String>,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: Option<String>,
    /// Timezone name (e.g. Europe/Paris)
    #[validate(length(min = 1, max = 50))]
    pub timezone: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let viewer_id = parse_user_id(&auth_user)?;

    let service = UserService::new(db.clone());
    let user = service.get_by_username(&username).await?;
    let (nb_followers, nb_following, nb_workouts) = service.profile_counts(user.id).await?;

    let is_followed_by_me = if viewer_id == user.id {
        None
    } else {
        Some(
            FollowService::new(db, hub)
                .is_following(viewer_id, user.id)
                .await?,
        )
    };

    let mut response = UserProfileResponse::from(user);
    response.nb_followers = Some(nb_followers);
    response.nb_following = Some(nb_following);
    response.nb_workouts = Some(nb_workouts);
    response.is_followed_by_me = is_followed_by_me;

    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = crate::handlers::auth::UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = ensure_active(&auth_user)?;

    let birth_date = match payload.birth_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse().map_err(|_| {
            AppError::Validation("birth_date must be in YYYY-MM-DD format".to_string())
        })?),
        None => None,
    };

    let service = UserService::new(db);
    let updated = service
        .update_profile(
            user_id,
            ProfileUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
                location: payload.location,
                birth_date,
                timezone: payload.timezone,
            },
        )
        .await?;

    Ok(ApiResponse::ok(crate::handlers::auth::UserResponse::from(
        updated,
    )))
}
