mod common;

use serde_json::Value;

struct Moderation {
    app: common::TestApp,
    admin_token: String,
    owner_id: i32,
    owner_token: String,
    report_id: i64,
    workout_id: i32,
}

/// Admin, a workout owner, a reporter and an open workout report.
async fn setup_workout_report() -> Moderation {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;

    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    let workout_id = common::create_test_workout(&app, &owner_token, sport_id, "public").await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&reporter_token)
        .json(&serde_json::json!({
            "object_type": "workout",
            "object_id": workout_id,
            "note": "doped performance"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    Moderation {
        app,
        admin_token,
        owner_id,
        owner_token,
        report_id,
        workout_id,
    }
}

async fn take_action(
    m: &Moderation,
    action_type: &str,
    reason: Option<&str>,
) -> reqwest::Response {
    m.app
        .client
        .post(m.app.url(&format!("/reports/{}/actions", m.report_id)))
        .bearer_auth(&m.admin_token)
        .json(&serde_json::json!({
            "action_type": action_type,
            "reason": reason
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn workout_suspension_hides_workout_from_others() {
    let m = setup_workout_report().await;
    let (_viewer_id, viewer_token) = common::create_test_user(&m.app, "viewer").await;

    let resp = take_action(&m, "workout_suspension", Some("rule violation")).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["action_type"], "workout_suspension");
    assert_eq!(body["data"]["user_id"], m.owner_id);

    // Hidden from other users
    let resp = m
        .app
        .client
        .get(m.app.url(&format!("/workouts/{}", m.workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // The owner still sees it, flagged as suspended
    let resp = m
        .app
        .client
        .get(m.app.url(&format!("/workouts/{}", m.workout_id)))
        .bearer_auth(&m.owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["suspended"], true);

    // The owner is notified
    let resp = m
        .app
        .client
        .get(m.app.url("/notifications?event_type=workout_suspension"))
        .bearer_auth(&m.owner_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn workout_unsuspension_restores_visibility() {
    let m = setup_workout_report().await;
    let (_viewer_id, viewer_token) = common::create_test_user(&m.app, "viewer").await;

    take_action(&m, "workout_suspension", None).await;
    let resp = take_action(&m, "workout_unsuspension", None).await;
    assert_eq!(resp.status(), 200);

    let resp = m
        .app
        .client
        .get(m.app.url(&format!("/workouts/{}", m.workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn suspending_twice_fails() {
    let m = setup_workout_report().await;

    take_action(&m, "workout_suspension", None).await;
    let resp = take_action(&m, "workout_suspension", None).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn user_suspension_blocks_writes_but_not_login() {
    let m = setup_workout_report().await;

    let resp = take_action(&m, "user_suspension", Some("repeated violations")).await;
    assert_eq!(resp.status(), 200);

    // Suspended user cannot create workouts
    let sport_id = common::get_sport_id(&m.app, &m.admin_token, "Running").await;
    let resp = m
        .app
        .client
        .post(m.app.url("/workouts/no_gpx"))
        .bearer_auth(&m.owner_token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": "2018-05-01 10:00",
            "distance": 5.0,
            "duration": 1800
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // But can still see their account and the suspension
    let resp = m
        .app
        .client
        .get(m.app.url("/auth/me"))
        .bearer_auth(&m.owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["suspended_at"].as_str().is_some());

    let resp = m
        .app
        .client
        .get(m.app.url("/auth/account/suspension"))
        .bearer_auth(&m.owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["action"]["action_type"], "user_suspension");
    assert_eq!(body["data"]["action"]["reason"], "repeated violations");
    assert_eq!(body["data"]["appeal"], Value::Null);
}

#[tokio::test]
async fn admin_account_cannot_be_suspended() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (other_admin_id, _other_admin_token) = common::create_test_user(&app, "admin2").await;
    common::make_admin(&app.db, other_admin_id).await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;

    // Report the other admin
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&reporter_token)
        .json(&serde_json::json!({
            "object_type": "user",
            "object_id": other_admin_id,
            "note": "reporting an admin"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/actions", report_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "action_type": "user_suspension" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn warning_is_logged_and_notified_once_per_report() {
    let m = setup_workout_report().await;

    let resp = take_action(&m, "user_warning", Some("tone it down")).await;
    assert_eq!(resp.status(), 200);

    let resp = m
        .app
        .client
        .get(m.app.url("/notifications?event_type=user_warning"))
        .bearer_auth(&m.owner_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    // A second warning on the same report conflicts
    let resp = take_action(&m, "user_warning", None).await;
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn action_type_must_match_report_target() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (target_id, _target_token) = common::create_test_user(&app, "target").await;
    let (_reporter_id, reporter_token) = common::create_test_user(&app, "reporter").await;

    // User report cannot take a workout action
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&reporter_token)
        .json(&serde_json::json!({
            "object_type": "user",
            "object_id": target_id,
            "note": "bot"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/reports/{}/actions", report_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "action_type": "workout_suspension" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn actions_require_admin() {
    let m = setup_workout_report().await;
    let (_user_id, user_token) = common::create_test_user(&m.app, "regular").await;

    let resp = m
        .app
        .client
        .post(m.app.url(&format!("/reports/{}/actions", m.report_id)))
        .bearer_auth(&user_token)
        .json(&serde_json::json!({ "action_type": "workout_suspension" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
