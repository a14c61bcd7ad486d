mod common;

use serde_json::Value;

async fn create_public_workout(app: &common::TestApp, token: &str) -> i32 {
    let sport_id = common::get_sport_id(app, token, "Running").await;
    common::create_test_workout(app, token, sport_id, "public").await
}

async fn report(
    app: &common::TestApp,
    token: &str,
    object_type: &str,
    object_id: i64,
    note: &str,
) -> reqwest::Response {
    app.client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "object_type": object_type,
            "object_id": object_id,
            "note": note
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn report_a_workout() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam route").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["object_type"], "workout");
    assert_eq!(body["data"]["reported_workout_id"], workout_id);
    assert_eq!(body["data"]["reported_comment_id"], Value::Null);
    assert_eq!(body["data"]["reported_user_id"], Value::Null);
    assert_eq!(body["data"]["resolved"], false);
}

#[tokio::test]
async fn report_a_comment() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({
            "workout_id": workout_id,
            "text": "offensive content",
            "text_visibility": "public"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = report(&app, &reporter_token, "comment", comment_id, "inappropriate").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["object_type"], "comment");
    assert_eq!(body["data"]["reported_comment_id"], comment_id);
}

#[tokio::test]
async fn report_a_user() {
    let app = common::spawn_app().await;
    let (target_id, _target_token) = common::create_test_user(&app, "target").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;

    let resp = report(&app, &reporter_token, "user", target_id as i64, "bot account").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["object_type"], "user");
    assert_eq!(body["data"]["reported_user_id"], target_id);
}

#[tokio::test]
async fn cannot_report_own_account() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "selfreporter").await;

    let resp = report(&app, &token, "user", user_id as i64, "i am bad").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn invalid_object_type_rejected() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "reporter").await;

    let resp = report(&app, &token, "sport", 1, "note").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn duplicate_open_report_conflicts() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    assert_eq!(resp.status(), 200);

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "again").await;
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn report_creation_notifies_admins() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;

    let resp = app
        .client
        .get(app.url("/notifications?event_type=report"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["total"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn users_only_see_their_own_reports() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_r1_id, r1_token) = common::create_test_user(&app, "r1").await;
    let (_r2_id, r2_token) = common::create_test_user(&app, "r2").await;
    let workout_id = create_public_workout(&app, &owner_token).await;
    let other_workout_id = create_public_workout(&app, &owner_token).await;

    report(&app, &r1_token, "workout", workout_id as i64, "spam").await;
    report(&app, &r2_token, "workout", other_workout_id as i64, "spam").await;

    let resp = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&r1_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn admin_sees_all_reports_with_filters() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (target_id, _target_token) = common::create_test_user(&app, "target").await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    report(&app, &reporter_token, "user", target_id as i64, "bot").await;

    let resp = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["total"].as_u64().unwrap() >= 2);

    let resp = app
        .client
        .get(app.url("/reports?object_type=user"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["total"].as_u64().unwrap() >= 1);
    for item in body["data"]["items"].as_array().unwrap() {
        assert_eq!(item["object_type"], "user");
    }
}

#[tokio::test]
async fn report_detail_forbidden_for_unrelated_user() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let (_other_id, other_token) = common::create_test_user(&app, "other").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The reporter can read it
    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&reporter_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn resolve_report_with_comment_thread() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    // Add a comment to the admin thread
    let resp = app
        .client
        .patch(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "comment": "looks like spam indeed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Resolve
    let resp = app
        .client
        .patch(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "resolved": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolved"], true);
    assert_eq!(body["data"]["resolved_by"], admin_id);

    // Detail shows thread and the resolution action
    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
    let actions = body["data"]["admin_actions"].as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["action_type"], "report_resolution");
}

#[tokio::test]
async fn reopen_resolved_report() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    for resolved in [true, false] {
        app.client
            .patch(app.url(&format!("/reports/{}", report_id)))
            .bearer_auth(&admin_token)
            .json(&serde_json::json!({ "resolved": resolved }))
            .send()
            .await
            .unwrap();
    }

    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["resolved"], false);
    assert_eq!(body["data"]["resolved_by"], Value::Null);
    let actions = body["data"]["admin_actions"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1]["action_type"], "report_reopening");
}

#[tokio::test]
async fn update_report_requires_admin() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;
    let workout_id = create_public_workout(&app, &owner_token).await;

    let resp = report(&app, &reporter_token, "workout", workout_id as i64, "spam").await;
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .patch(app.url(&format!("/reports/{}", report_id)))
        .bearer_auth(&reporter_token)
        .json(&serde_json::json!({ "resolved": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
