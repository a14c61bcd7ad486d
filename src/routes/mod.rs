use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::websocket;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket route (auth handled inside the handler via query token)
        .route("/ws", routing::get(websocket::notification::ws_handler))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public = public_routes();
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));
    let uploads = upload_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public).merge(protected).merge(uploads)
}

/// Auth routes: registration, login and token/password recovery.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route(
            "/auth/refresh",
            routing::post(handlers::auth::refresh_token),
        )
        .route("/auth/verify-email", routing::post(handlers::verify_email))
        .route(
            "/auth/forgot-password",
            routing::post(handlers::auth::forgot_password),
        )
        .route(
            "/auth/reset-password",
            routing::post(handlers::auth::reset_password),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Unauthenticated routes: map images are embedded in shared pages.
fn public_routes() -> Router {
    Router::new().route(
        "/workouts/map/{map_id}",
        routing::get(handlers::workout::get_workout_map),
    )
}

/// File uploads, rate limited separately.
fn upload_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route(
        "/auth/picture",
        routing::post(handlers::upload::upload_picture),
    );

    with_optional_rate_limit(router, config.enabled, config.uploads)
}

/// Protected routes: everything behind JWT authentication.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        .route(
            "/auth/profile",
            routing::put(handlers::user::update_profile),
        )
        .route("/auth/password", routing::put(handlers::change_password))
        .route(
            "/auth/resend-verification",
            routing::post(handlers::resend_verification),
        )
        // Account suspension (still reachable while suspended)
        .route(
            "/auth/account/suspension",
            routing::get(handlers::appeal::get_account_suspension),
        )
        .route(
            "/auth/account/suspension/appeal",
            routing::post(handlers::appeal::appeal_account_suspension),
        )
        // Users
        .route(
            "/users/{username}",
            routing::get(handlers::user::get_user_profile),
        )
        .route(
            "/users/{id}/followers",
            routing::get(handlers::follow::list_followers),
        )
        .route(
            "/users/{id}/following",
            routing::get(handlers::follow::list_following),
        )
        .route(
            "/users/{id}/follow",
            routing::post(handlers::follow::toggle_follow),
        )
        // Sports
        .route("/sports", routing::get(handlers::sport::list_sports))
        .route("/sports/{id}", routing::get(handlers::sport::get_sport))
        // Workouts
        .route(
            "/workouts",
            routing::post(handlers::workout::create_workout)
                .get(handlers::workout::list_workouts),
        )
        .route(
            "/workouts/no_gpx",
            routing::post(handlers::workout::create_workout_no_gpx),
        )
        .route("/timeline", routing::get(handlers::workout::timeline))
        .route(
            "/workouts/{id}",
            routing::get(handlers::workout::get_workout)
                .patch(handlers::workout::update_workout)
                .delete(handlers::workout::delete_workout),
        )
        .route(
            "/workouts/{id}/gpx",
            routing::get(handlers::workout::get_workout_gpx),
        )
        .route(
            "/workouts/{id}/chart_data",
            routing::get(handlers::workout::get_workout_chart_data),
        )
        .route(
            "/workouts/{id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        .route(
            "/workouts/{id}/like",
            routing::post(handlers::like::like_workout),
        )
        // Comments
        .route(
            "/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::patch(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route(
            "/comments/{id}/like",
            routing::post(handlers::like::like_comment),
        )
        // Records and statistics
        .route("/records", routing::get(handlers::stats::get_records))
        .route(
            "/stats/{username}/by-sport",
            routing::get(handlers::stats::stats_by_sport),
        )
        .route(
            "/stats/{username}/by-time",
            routing::get(handlers::stats::stats_by_time),
        )
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            routing::put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        )
        // Reports and moderation
        .route(
            "/reports",
            routing::post(handlers::report::create_report)
                .get(handlers::report::list_reports),
        )
        .route(
            "/reports/{id}",
            routing::get(handlers::report::get_report)
                .patch(handlers::report::update_report),
        )
        .route(
            "/reports/{id}/actions",
            routing::post(handlers::report::create_report_action),
        )
        .route(
            "/admin-actions/{id}/appeal",
            routing::post(handlers::appeal::appeal_action),
        )
        // Admin
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/users/{id}/activate",
            routing::post(handlers::admin::activate_user),
        )
        .route(
            "/admin/sports/{id}",
            routing::patch(handlers::sport::update_sport),
        )
        .route(
            "/admin/appeals",
            routing::get(handlers::appeal::list_appeals),
        )
        .route(
            "/admin/appeals/{id}",
            routing::patch(handlers::appeal::process_appeal),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
