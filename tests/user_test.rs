mod common;

use serde_json::Value;

async fn username_of(app: &common::TestApp, token: &str) -> String {
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    body["data"]["username"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn get_user_profile_with_counts() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "profile").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "viewer").await;

    let username = username_of(&app, &token).await;

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", username)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], username);
    assert_eq!(body["data"]["nb_followers"], 0);
    assert_eq!(body["data"]["nb_workouts"], 0);
    assert_eq!(body["data"]["is_followed_by_me"], false);
}

#[tokio::test]
async fn profile_shows_follow_state() {
    let app = common::spawn_app().await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (_follower_id, follower_token) = common::create_test_user(&app, "follower").await;

    app.client
        .post(app.url(&format!("/users/{}/follow", target_id)))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();

    let username = username_of(&app, &target_token).await;
    let resp = app
        .client
        .get(app.url(&format!("/users/{}", username)))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_followed_by_me"], true);
    assert_eq!(body["data"]["nb_followers"], 1);
}

#[tokio::test]
async fn update_profile_fields() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "editor").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "first_name": "Jane",
            "last_name": "Doe",
            "bio": "I ride bikes",
            "location": "Annecy",
            "birth_date": "1990-05-20",
            "timezone": "Europe/Paris"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["first_name"], "Jane");
    assert_eq!(body["data"]["location"], "Annecy");
    assert_eq!(body["data"]["birth_date"], "1990-05-20");
    assert_eq!(body["data"]["timezone"], "Europe/Paris");
}

#[tokio::test]
async fn update_profile_rejects_invalid_birth_date() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "baddate").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "birth_date": "20/05/1990" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_user_profile_returns_404() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "someone").await;

    let resp = app
        .client
        .get(app.url("/users/no_such_user"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
