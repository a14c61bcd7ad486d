use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use crate::utils::cookie::{
    build_auth_cookie, build_clear_cookie, extract_cookie, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-30 characters)
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// User ID
    pub user_id: i32,
    /// Username
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// User ID
    pub user_id: i32,
    /// Username
    pub username: String,
    /// Success message
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    pub id: i32,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// User bio
    pub bio: Option<String>,
    /// Location
    pub location: Option<String>,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: Option<String>,
    /// Timezone name
    pub timezone: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// User role (user, admin)
    pub role: String,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Suspension timestamp, if the account is suspended
    pub suspended_at: Option<String>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            location: user.location,
            birth_date: user.birth_date.map(|d| d.to_string()),
            timezone: user.timezone,
            avatar_url: user.avatar_url,
            role: user.role,
            email_verified: user.email_verified,
            suspended_at: user.suspended_at.map(|t| t.to_string()),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Registration disabled", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    // Validate input
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    let (user, access_token, refresh_token) = service
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            &email_service,
        )
        .await?;

    let auth_config = crate::config::auth::AuthConfig::from_env();
    let message = if auth_config.require_email_verification {
        "Registration successful. Please check your email to verify your account.".to_string()
    } else {
        "Registration successful.".to_string()
    };

    let response = RegisterResponse {
        token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        user_id: user.id,
        username: user.username,
        message,
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &access_token, &refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, access_token, refresh_token) =
        service.login(&payload.username, &payload.password).await?;

    let response = AuthResponse {
        token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        user_id: user.id,
        username: user.username,
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &access_token, &refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = AuthService::new(db);
    let user = service.get_user_by_id(user_id).await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password
    pub current_password: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    security(("jwt_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = String),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;

    let service = AuthService::new(db);
    service
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok("Password changed successfully"))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    /// Email verification token
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified successfully", body = String),
        (status = 400, description = "Invalid token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<VerifyEmailRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    service.verify_email(&payload.token).await?;
    Ok(ApiResponse::ok("Email verified successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Verification email sent", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = AuthService::new(db);
    service.resend_verification(user_id, &email_service).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Verification email sent" }),
    ))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset email sent if account exists", body = serde_json::Value),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .forgot_password(&payload.email, &email_service)
        .await?;

    // Always return success to prevent email enumeration
    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "If an account with that email exists, a password reset link has been sent." }),
    ))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// Password reset token
    pub token: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successfully", body = serde_json::Value),
        (status = 400, description = "Invalid token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Password has been reset successfully" }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// New JWT access token
    pub token: String,
    /// New JWT refresh token
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token generated", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let refresh_token = payload
        .and_then(|Json(body)| body.refresh_token)
        .or_else(|| extract_cookie(&headers, REFRESH_TOKEN_COOKIE))
        .ok_or(AppError::Unauthorized)?;

    // Decode the refresh token
    let claims = crate::utils::jwt::decode_jwt(&refresh_token).map_err(|_| AppError::Unauthorized)?;

    // Verify it's a refresh token
    if !crate::utils::jwt::is_refresh_token(&claims) {
        return Err(AppError::Unauthorized);
    }

    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    // Verify user exists and rotate the stored token
    let service = AuthService::new(db);
    let _user = service.get_user_by_id(user_id).await?;
    let (access_token, new_refresh_token) = service
        .rotate_refresh_token(user_id, &refresh_token)
        .await?;

    let response = TokenResponse {
        token: access_token.clone(),
        refresh_token: new_refresh_token.clone(),
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &access_token, &new_refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Logged out", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    _auth_user: AuthUser,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let refresh_token = payload
        .and_then(|Json(body)| body.refresh_token)
        .or_else(|| extract_cookie(&headers, REFRESH_TOKEN_COOKIE));

    if let Some(refresh_token) = refresh_token {
        let service = AuthService::new(db);
        service.revoke_refresh_token(&refresh_token).await?;
    }

    let mut http_response = ApiResponse::ok("Logged out").into_response();
    clear_auth_cookies(&mut http_response)?;
    Ok(http_response)
}

fn set_auth_cookies(
    response: &mut Response,
    access_token: &str,
    refresh_token: &str,
) -> AppResult<()> {
    let access_cookie = build_auth_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token,
        crate::utils::jwt::access_token_expiry_seconds(),
    );
    let refresh_cookie = build_auth_cookie(
        REFRESH_TOKEN_COOKIE,
        refresh_token,
        crate::utils::jwt::refresh_token_expiry_seconds(),
    );

    append_cookie(response, &access_cookie)?;
    append_cookie(response, &refresh_cookie)?;
    Ok(())
}

fn clear_auth_cookies(response: &mut Response) -> AppResult<()> {
    append_cookie(response, &build_clear_cookie(ACCESS_TOKEN_COOKIE))?;
    append_cookie(response, &build_clear_cookie(REFRESH_TOKEN_COOKIE))?;
    Ok(())
}

fn append_cookie(response: &mut Response, cookie: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie value: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
