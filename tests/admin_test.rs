mod common;

use serde_json::Value;

#[tokio::test]
async fn admin_stats() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_user_id, user_token) = common::create_test_user(&app, "athlete").await;
    let sport_id = common::get_sport_id(&app, &user_token, "Running").await;
    common::create_test_workout(&app, &user_token, sport_id, "private").await;

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["users"].as_u64().unwrap() >= 2);
    assert!(body["data"]["workouts"].as_u64().unwrap() >= 1);
    assert!(body["data"]["pending_reports"].as_u64().is_some());
}

#[tokio::test]
async fn stats_require_admin() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "regular").await;

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn list_users_with_filter() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    common::create_test_user(&app, "findme").await;
    common::create_test_user(&app, "someoneelse").await;

    let resp = app
        .client
        .get(app.url("/admin/users?q=findme"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"][0]["username"]
        .as_str()
        .unwrap()
        .starts_with("findme"));
}

#[tokio::test]
async fn update_user_role() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (user_id, user_token) = common::create_test_user(&app, "promotee").await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", user_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "admin");

    // The promoted user now has admin access
    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn invalid_role_rejected() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (user_id, _user_token) = common::create_test_user(&app, "victim").await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", user_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "superuser" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn admin_cannot_change_own_role() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", admin_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn activate_user_account() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (user_id, _user_token) = common::create_test_user(&app, "inactive").await;

    let resp = app
        .client
        .post(app.url(&format!("/admin/users/{}/activate", user_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["email_verified"], true);
}
