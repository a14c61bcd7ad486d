#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
// Migrations and table cleanup run once per test binary; tests within a
// binary run in parallel and use unique usernames instead of truncating.
static DB_SETUP: OnceCell<()> = OnceCell::const_new();

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Deterministic tests: no rate limiting, no email verification gate
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("REQUIRE_EMAIL_VERIFICATION", "false");
        let config = fittrackee::config::jwt::JwtConfig::from_env().unwrap();
        let _ = fittrackee::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    DB_SETUP
        .get_or_init(|| async {
            fittrackee::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            // Clean data tables (reverse dependency order); sports stay seeded
            cleanup_tables(&db).await;
        })
        .await;

    let hub = fittrackee::websocket::hub::NotificationHub::new();
    let upload_config = fittrackee::services::upload::UploadConfig {
        upload_dir: "./test_uploads".to_string(),
    };
    let email_service = fittrackee::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(fittrackee::routes::create_routes())
        .layer(axum::middleware::from_fn(
            fittrackee::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(hub))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "refresh_tokens",
        "appeals",
        "admin_actions",
        "report_comments",
        "reports",
        "notifications",
        "likes",
        "mentions",
        "comments",
        "records",
        "workout_segments",
        "workouts",
        "follows",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for user '{}': status={}, error={}",
            unique_username, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["user_id"].as_i64().unwrap_or_else(|| {
        panic!(
            "Response missing user_id for user '{}': {:?}",
            unique_username, body
        )
    }) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| {
            panic!(
                "Response missing token for user '{}': {:?}",
                unique_username, body
            )
        })
        .to_string();
    (user_id, token)
}

/// Make a user admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'admin' WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// Get the id of a seeded sport by label.
pub async fn get_sport_id(app: &TestApp, token: &str, label: &str) -> i32 {
    let resp = app
        .client
        .get(app.url("/sports"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list sports");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse sports response");
    let sports = body["data"].as_array().expect("Sports response is not an array");
    sports
        .iter()
        .find(|s| s["label"] == label)
        .unwrap_or_else(|| panic!("Sport '{}' not found in {:?}", label, sports))["id"]
        .as_i64()
        .expect("Sport missing id") as i32
}

/// Create a workout without a gpx file and return its id.
pub async fn create_test_workout(
    app: &TestApp,
    token: &str,
    sport_id: i32,
    visibility: &str,
) -> i32 {
    let resp = app
        .client
        .post(app.url("/workouts/no_gpx"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": "2018-01-01 13:44",
            "distance": 10.0,
            "duration": 3600,
            "workout_visibility": visibility,
            "map_visibility": visibility
        }))
        .send()
        .await
        .expect("Failed to create workout");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create workout: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("Workout missing id") as i32
}

/// A small valid gpx file: 10 points going north, one per minute.
pub fn gpx_file() -> String {
    let mut points = String::new();
    for i in 0..10 {
        points.push_str(&format!(
            "<trkpt lat=\"{}\" lon=\"6.07367\"><ele>{}</ele><time>2018-01-01T13:{:02}:00Z</time></trkpt>",
            44.68095 + 0.001 * i as f64,
            998.0 + i as f64,
            44 + i
        ));
    }
    format!(
        "<?xml version='1.0' encoding='UTF-8'?>\
        <gpx xmlns=\"http://www.topografix.com/GPX/1/1\" version=\"1.1\" creator=\"test\">\
        <trk><name>just a workout</name><trkseg>{}</trkseg></trk></gpx>",
        points
    )
}

/// Upload a gpx workout and return the response body.
pub async fn upload_gpx_workout(
    app: &TestApp,
    token: &str,
    sport_id: i32,
    data: serde_json::Value,
) -> serde_json::Value {
    let mut payload = data;
    payload["sport_id"] = serde_json::json!(sport_id);

    let part = reqwest::multipart::Part::bytes(gpx_file().into_bytes())
        .file_name("workout.gpx")
        .mime_str("application/gpx+xml")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("data", payload.to_string())
        .part("file", part);

    let resp = app
        .client
        .post(app.url("/workouts"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload workout");

    resp.json().await.expect("Failed to parse upload response")
}
