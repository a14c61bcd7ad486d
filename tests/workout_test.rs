mod common;

use serde_json::Value;

#[tokio::test]
async fn create_workout_without_gpx() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "runner").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    let resp = app
        .client
        .post(app.url("/workouts/no_gpx"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": "2018-01-01 13:44",
            "distance": 10.0,
            "duration": 3600,
            "title": "Morning run"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["title"], "Morning run");
    assert_eq!(body["data"]["distance"], 10.0);
    assert_eq!(body["data"]["duration"], "1:00:00");
    assert_eq!(body["data"]["moving"], "1:00:00");
    assert_eq!(body["data"]["ave_speed"], 10.0);
    assert_eq!(body["data"]["with_gpx"], false);
    // Default visibility is private
    assert_eq!(body["data"]["workout_visibility"], "private");
}

#[tokio::test]
async fn create_workout_without_gpx_requires_positive_values() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "zeroes").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    let resp = app
        .client
        .post(app.url("/workouts/no_gpx"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": "2018-01-01 13:44",
            "distance": 0.0,
            "duration": 3600
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn upload_gpx_workout_computes_stats() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "cyclist").await;
    let sport_id = common::get_sport_id(&app, &token, "Cycling (Sport)").await;

    let body = common::upload_gpx_workout(&app, &token, sport_id, serde_json::json!({})).await;
    assert!(body["success"].as_bool().unwrap(), "body: {}", body);

    // Title falls back to the gpx track name
    assert_eq!(body["data"]["title"], "just a workout");
    assert_eq!(body["data"]["with_gpx"], true);
    // 9 one-minute intervals
    assert_eq!(body["data"]["duration"], "0:09:00");
    assert_eq!(body["data"]["workout_date"], "2018-01-01 13:44:00");
    // ~1 km of northward track
    let distance = body["data"]["distance"].as_f64().unwrap();
    assert!((distance - 1.0).abs() < 0.05, "distance: {}", distance);
    assert_eq!(body["data"]["min_alt"], 998.0);
    assert_eq!(body["data"]["max_alt"], 1007.0);
    assert!(body["data"]["map_id"].as_str().is_some());
}

#[tokio::test]
async fn upload_rejects_non_gpx_content() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "badfile").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    let part = reqwest::multipart::Part::bytes(b"not a gpx file".to_vec())
        .file_name("workout.gpx")
        .mime_str("application/gpx+xml")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("data", serde_json::json!({ "sport_id": sport_id }).to_string())
        .part("file", part);

    let resp = app
        .client
        .post(app.url("/workouts"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn workout_detail_has_segments_and_neighbors() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "detail").await;
    let sport_id = common::get_sport_id(&app, &token, "Cycling (Sport)").await;

    let body = common::upload_gpx_workout(&app, &token, sport_id, serde_json::json!({})).await;
    let workout_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url("/workouts/no_gpx"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "sport_id": sport_id,
            "workout_date": "2018-06-01 10:00",
            "distance": 10.0,
            "duration": 3600
        }))
        .send()
        .await
        .unwrap();
    let later: Value = resp.json().await.unwrap();
    let later_id = later["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let segments = body["data"]["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(body["data"]["previous_workout"], Value::Null);
    assert_eq!(body["data"]["next_workout"], later_id);
    assert_eq!(body["data"]["nb_likes"], 0);
}

#[tokio::test]
async fn list_workouts_with_filters() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "lister").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;

    for (date, distance, duration) in [
        ("2018-01-01 10:00", 5.0, 1800),
        ("2018-02-01 10:00", 10.0, 3600),
        ("2018-03-01 10:00", 20.0, 7200),
    ] {
        app.client
            .post(app.url("/workouts/no_gpx"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "sport_id": sport_id,
                "workout_date": date,
                "distance": distance,
                "duration": duration
            }))
            .send()
            .await
            .unwrap();
    }

    // Default order is newest first
    let resp = app
        .client
        .get(app.url("/workouts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["distance"], 20.0);

    // Date filter
    let resp = app
        .client
        .get(app.url("/workouts?from=2018-01-15&to=2018-02-15"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["distance"], 10.0);

    // Distance filter
    let resp = app
        .client
        .get(app.url("/workouts?distance_from=8&distance_to=15"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    // Duration filter (moving time >= 1:30)
    let resp = app
        .client
        .get(app.url("/workouts?duration_from=1:30"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["distance"], 20.0);

    // Ascending order
    let resp = app
        .client
        .get(app.url("/workouts?order=asc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"][0]["distance"], 5.0);
}

#[tokio::test]
async fn update_workout_recomputes_speeds() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "updater").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;
    let workout_id = common::create_test_workout(&app, &token, sport_id, "private").await;

    let resp = app
        .client
        .patch(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Renamed",
            "distance": 20.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["distance"], 20.0);
    assert_eq!(body["data"]["ave_speed"], 20.0);
}

#[tokio::test]
async fn update_workout_of_another_user_fails() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "owner").await;
    let (_other_id, other_token) = common::create_test_user(&app, "other").await;
    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    let workout_id = common::create_test_workout(&app, &owner_token, sport_id, "public").await;

    let resp = app
        .client
        .patch(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn delete_workout() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "deleter").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;
    let workout_id = common::create_test_workout(&app, &token, sport_id, "private").await;

    let resp = app
        .client
        .delete(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn private_workout_hidden_from_others() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "private_owner").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "viewer").await;
    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    let workout_id = common::create_test_workout(&app, &owner_token, sport_id, "private").await;

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn public_workout_visible_to_others() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_test_user(&app, "public_owner").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "viewer").await;
    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    let workout_id = common::create_test_workout(&app, &owner_token, sport_id, "public").await;

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // Notes are only serialized for the owner
    assert_eq!(body["data"]["notes"], Value::Null);
}

#[tokio::test]
async fn followers_only_workout_requires_follow() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_test_user(&app, "fo_owner").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "fo_viewer").await;
    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    let workout_id =
        common::create_test_workout(&app, &owner_token, sport_id, "followers_only").await;

    // Not a follower yet
    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Follow, then the workout is visible
    app.client
        .post(app.url(&format!("/users/{}/follow", owner_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}", workout_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn timeline_includes_followed_users() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_test_user(&app, "tl_owner").await;
    let (_viewer_id, viewer_token) = common::create_test_user(&app, "tl_viewer").await;
    let sport_id = common::get_sport_id(&app, &owner_token, "Running").await;
    common::create_test_workout(&app, &owner_token, sport_id, "followers_only").await;
    common::create_test_workout(&app, &owner_token, sport_id, "private").await;

    // Before following: empty timeline
    let resp = app
        .client
        .get(app.url("/timeline"))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);

    app.client
        .post(app.url(&format!("/users/{}/follow", owner_id)))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();

    // After following: only the followers_only workout shows up
    let resp = app
        .client
        .get(app.url("/timeline"))
        .bearer_auth(&viewer_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn gpx_download_and_chart_data() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "downloader").await;
    let sport_id = common::get_sport_id(&app, &token, "Cycling (Sport)").await;

    let body = common::upload_gpx_workout(&app, &token, sport_id, serde_json::json!({})).await;
    let workout_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}/gpx", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["gpx"].as_str().unwrap().contains("<trkpt"));

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}/chart_data", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let chart = body["data"]["chart_data"].as_array().unwrap();
    assert_eq!(chart.len(), 10);
    assert_eq!(chart[0]["duration"], 0);
}

#[tokio::test]
async fn gpx_of_workout_without_file_returns_400() {
    let app = common::spawn_app().await;
    let (_user_id, token) = common::create_test_user(&app, "nogpx").await;
    let sport_id = common::get_sport_id(&app, &token, "Running").await;
    let workout_id = common::create_test_workout(&app, &token, sport_id, "private").await;

    let resp = app
        .client
        .get(app.url(&format!("/workouts/{}/gpx", workout_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_map_returns_404() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/workouts/map/doesnotexist"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
