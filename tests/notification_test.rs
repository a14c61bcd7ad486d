mod common;

use serde_json::Value;

async fn follow(app: &common::TestApp, token: &str, target_id: i32) {
    app.client
        .post(app.url(&format!("/users/{}/follow", target_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn list_and_unread_count() {
    let app = common::spawn_app().await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (_f1_id, f1_token) = common::create_test_user(&app, "f1").await;
    let (_f2_id, f2_token) = common::create_test_user(&app, "f2").await;

    follow(&app, &f1_token, target_id).await;
    follow(&app, &f2_token, target_id).await;

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);

    let resp = app
        .client
        .get(app.url("/notifications/unread-count"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 2);
}

#[tokio::test]
async fn mark_single_notification_read() {
    let app = common::spawn_app().await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (_follower_id, follower_token) = common::create_test_user(&app, "follower").await;

    follow(&app, &follower_token, target_id).await;

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let notification_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", notification_id)))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/notifications?read_status=false"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn cannot_mark_someone_elses_notification() {
    let app = common::spawn_app().await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (_follower_id, follower_token) = common::create_test_user(&app, "follower").await;
    let (_other_id, other_token) = common::create_test_user(&app, "other").await;

    follow(&app, &follower_token, target_id).await;

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let notification_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", notification_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn mark_all_read() {
    let app = common::spawn_app().await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (_f1_id, f1_token) = common::create_test_user(&app, "f1").await;
    let (_f2_id, f2_token) = common::create_test_user(&app, "f2").await;

    follow(&app, &f1_token, target_id).await;
    follow(&app, &f2_token, target_id).await;

    let resp = app
        .client
        .put(app.url("/notifications/read-all"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["marked_read"], 2);

    let resp = app
        .client
        .get(app.url("/notifications/unread-count"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 0);
}
