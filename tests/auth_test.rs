mod common;

use serde_json::Value;

#[tokio::test]
async fn login_with_username_and_email() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "login").await;

    // Get the generated username/email
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let username = body["data"]["username"].as_str().unwrap().to_string();
    let email = body["data"]["email"].as_str().unwrap().to_string();

    for identifier in [username, email] {
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .json(&serde_json::json!({
                "username": identifier,
                "password": "test_password_123"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert!(body["data"]["token"].as_str().is_some());
        assert!(body["data"]["refresh_token"].as_str().is_some());
    }
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "wrongpw").await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let username = body["data"]["username"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "username": username,
            "password": "not_the_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn register_rejects_invalid_username() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "bad name!",
            "email": "badname@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "dup").await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let username = body["data"]["username"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": "other@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn me_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn refresh_token_rotation() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "rotation_user",
            "email": "rotation_user@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

    // First refresh succeeds
    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let new_refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(refresh_token, new_refresh_token);

    // The old token has been rotated out
    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn change_password_revokes_refresh_tokens() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "pwchange_user",
            "email": "pwchange_user@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .client
        .put(app.url("/auth/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": "test_password_123",
            "new_password": "a_brand_new_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/forgot-password"))
        .json(&serde_json::json!({ "email": "nobody@test.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
