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

async fn post_workout(
    app: &common::TestApp,
    token: &str,
    sport_id: i32,
    date: &str,
    distance: f64,
    duration: i32,
) -> i64 {
    let resp = app
        .client
        .post(app.url("/workouts/no_gpx"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": date,
            "distance": distance,
            "duration": duration
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn records_created_for_workouts() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "recorder").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    // 10 km/h, then a faster 12 km/h workout
    post_workout(&app, &token, sport_id, "2018-01-01 10:00", 10.0, 3600).await;
    post_workout(&app, &token, sport_id, "2018-01-02 10:00", 12.0, 3600).await;

    let resp = app
        .client
        .get(app.url("/records"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let records = body["data"].as_array().unwrap();
    // AS, FD, LD, MS
    assert_eq!(records.len(), 4);

    let avg_speed = records
        .iter()
        .find(|r| r["record_type"] == "AS")
        .unwrap();
    assert_eq!(avg_speed["value"], 12.0);

    let farthest = records
        .iter()
        .find(|r| r["record_type"] == "FD")
        .unwrap();
    assert_eq!(farthest["value"], 12.0);

    let longest = records
        .iter()
        .find(|r| r["record_type"] == "LD")
        .unwrap();
    assert_eq!(longest["value"], "1:00:00");
}

#[tokio::test]
async fn deleting_record_workout_recomputes_records() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "rec_delete").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    post_workout(&app, &token, sport_id, "2018-01-01 10:00", 10.0, 3600).await;
    let best_id = post_workout(&app, &token, sport_id, "2018-01-02 10:00", 15.0, 3600).await;

    app.client
        .delete(app.url(&format!("/workouts/{}", best_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/records"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let records = body["data"].as_array().unwrap();
    let farthest = records
        .iter()
        .find(|r| r["record_type"] == "FD")
        .unwrap();
    assert_eq!(farthest["value"], 10.0);
}

#[tokio::test]
async fn deleting_last_workout_removes_records() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "rec_empty").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    let workout_id = post_workout(&app, &token, sport_id, "2018-01-01 10:00", 10.0, 3600).await;
    app.client
        .delete(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/records"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn stats_by_sport_aggregates_totals() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "stats_sport").await;
    let running_id = common::get_sport_id(&app, &token, "Running").await;
    let cycling_id = common::get_sport_id(&app, &token, "Cycling (Sport)").await;

    post_workout(&app, &token, running_id, "2018-01-01 10:00", 10.0, 3600).await;
    post_workout(&app, &token, running_id, "2018-01-08 10:00", 12.0, 3600).await;
    post_workout(&app, &token, cycling_id, "2018-01-02 10:00", 30.0, 3600).await;

    let username = username_of(&app, &token).await;
    let resp = app
        .client
        .get(app.url(&format!("/stats/{}/by-sport", username)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let stats = &body["data"]["statistics"];
    assert_eq!(stats[running_id.to_string()]["nb_workouts"], 2);
    assert_eq!(stats[running_id.to_string()]["total_distance"], 22.0);
    assert_eq!(stats[running_id.to_string()]["total_duration"], 7200);
    assert_eq!(stats[cycling_id.to_string()]["nb_workouts"], 1);
}

#[tokio::test]
async fn stats_by_time_buckets_by_month() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "stats_time").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    post_workout(&app, &token, sport_id, "2018-01-01 10:00", 10.0, 3600).await;
    post_workout(&app, &token, sport_id, "2018-01-20 10:00", 5.0, 1800).await;
    post_workout(&app, &token, sport_id, "2018-02-01 10:00", 8.0, 2400).await;

    let username = username_of(&app, &token).await;
    let resp = app
        .client
        .get(app.url(&format!(
            "/stats/{}/by-time?from=2018-01-01&to=2018-12-31&time=month",
            username
        )))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let stats = &body["data"]["statistics"];
    assert_eq!(stats["2018-01"][sport_id.to_string()]["nb_workouts"], 2);
    assert_eq!(stats["2018-02"][sport_id.to_string()]["nb_workouts"], 1);
}

#[tokio::test]
async fn stats_of_other_user_require_admin() {
    let app = common::spawn_app().await;
    let (_target_id, target_token) = common::create_test_user(&app, "stats_target").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "stats_viewer").await;
    let (admin_id, admin_token) = common::create_test_user(&app, "stats_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let username = username_of(&app, &target_token).await;

    let resp = app
        .client
        .get(app.url(&format!("/stats/{}/by-sport", username)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url(&format!("/stats/{}/by-sport", username)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
