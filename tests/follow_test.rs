mod common;

use serde_json::Value;

#[tokio::test]
async fn toggle_follow() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "follower").await;
    let (target_id, _target_token) = common::create_test_user(&app, "target").await;

    // Follow
    let resp = app
        .client
        .post(app.url(&format!("/users/{}/follow", target_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["following"], true);

    // Check followers
    let resp = app
        .client
        .get(app.url(&format!("/users/{}/followers", target_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    // Unfollow (toggle)
    let resp = app
        .client
        .post(app.url(&format!("/users/{}/follow", target_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["following"], false);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/followers", target_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn self_follow_error() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "selffollow").await;

    let resp = app
        .client
        .post(app.url(&format!("/users/{}/follow", user_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn follow_unknown_user_returns_404() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "follower").await;

    let resp = app
        .client
        .post(app.url("/users/999999/follow"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn follow_notifies_target() {
    let app = common::spawn_app().await;
    let (_follower_id, follower_token) = common::create_test_user(&app, "notify_follower").await;
    let (target_id, target_token) = common::create_test_user(&app, "notify_target").await;

    app.client
        .post(app.url(&format!("/users/{}/follow", target_id)))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/notifications?event_type=follow"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"][0]["message"]
        .as_str()
        .unwrap()
        .contains("is now following you"));
}

#[tokio::test]
async fn following_list() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "lister").await;
    let (target1, _) = common::create_test_user(&app, "t1").await;
    let (target2, _) = common::create_test_user(&app, "t2").await;

    for target in [target1, target2] {
        app.client
            .post(app.url(&format!("/users/{}/follow", target)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/following", user_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
}
