//! Integration tests for the `/api/tasks` resource and the processor behind it.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, get, post, post_json, FakeBuilder, FakeMode, TestApp};
use serde_json::json;
use torrentforge_core::task::{Category, NewTask, TaskStatus};

async fn create(app: &TestApp, body: serde_json::Value) -> Vec<String> {
    let response = post_json(app, "/api/tasks", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["ids"]
        .as_array()
        .expect("ids array")
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Test: POST /api/tasks returns one id per item, all runnable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_one_id_per_item() {
    let app = TestApp::new().await;

    let ids = create(
        &app,
        json!({
            "category": "series",
            "items": [
                {"name": "Show.S01", "language_tag": "VOSTFR"},
                {"name": "Show.S02"},
                {"name": "Other.S01", "lang_tag": "VFF"},
            ]
        }),
    )
    .await;
    assert_eq!(ids.len(), 3);

    let tasks = body_json(get(&app, "/api/tasks").await).await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    for (task, id) in tasks.iter().zip(&ids) {
        assert_eq!(task["id"], id.as_str());
        assert_eq!(task["status"], "running");
        assert_eq!(task["progress"], 0);
        assert_eq!(task["category"], "series");
    }
    assert_eq!(tasks[0]["language_tag"], "VOSTFR");
    assert_eq!(tasks[1]["language_tag"], "MULTI");
    assert_eq!(tasks[2]["language_tag"], "VFF");
    assert_eq!(
        tasks[0]["source_path"],
        app.path("media/series/Show.S01").to_str().unwrap()
    );
}

// ---------------------------------------------------------------------------
// Test: free-text category aliases are accepted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_accepts_type_alias_and_localized_category() {
    let app = TestApp::new().await;
    let ids = create(&app, json!({"type": "films", "tasks": [{"name": "Heat.1995"}]})).await;

    let task = body_json(get(&app, &format!("/api/tasks/{}", ids[0])).await).await;
    assert_eq!(task["category"], "movies");
}

// ---------------------------------------------------------------------------
// Test: invalid create bodies are rejected with 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_rejects_invalid_bodies() {
    let app = TestApp::new().await;

    for body in [
        json!({"category": "series", "items": []}),
        json!({"category": "music", "items": [{"name": "A"}]}),
        json!({"category": "series", "items": [{"name": "../escape"}]}),
        json!({"items": [{"name": "A"}]}),
    ] {
        let response = post_json(&app, "/api/tasks", body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }
    assert!(app.state.tasks.list().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: GET /api/tasks/{id} on an unknown id returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_task_returns_404() {
    let app = TestApp::new().await;

    for response in [
        get(&app, "/api/tasks/deadbeef").await,
        post(&app, "/api/tasks/deadbeef/retry").await,
        post(&app, "/api/tasks/deadbeef/delete").await,
        post(&app, "/api/tasks/deadbeef/cancel").await,
    ] {
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

// ---------------------------------------------------------------------------
// Test: a processed task produces the named artifact and completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn processed_task_produces_named_artifact() {
    let mut app = TestApp::new().await;
    app.series_source("Show.S01");
    app.start_processor();

    let ids = create(
        &app,
        json!({"category": "series", "items": [{"name": "Show.S01", "language_tag": "VOSTFR"}]}),
    )
    .await;
    app.wait_finished(&ids[0]).await;

    let task = body_json(get(&app, &format!("/api/tasks/{}", ids[0])).await).await;
    assert_eq!(task["status"], "completed");
    assert_eq!(task["progress"], 100);
    assert!(app.path("out/series/Show.S01 [VOSTFR].torrent").is_file());
    assert_eq!(app.builder.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: a task whose source is missing ends cancelled with an error log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_source_ends_cancelled_with_log() {
    let mut app = TestApp::new().await;
    app.start_processor();

    let ids = create(&app, json!({"category": "series", "items": [{"name": "Ghost"}]})).await;
    let task = app.wait_finished(&ids[0]).await;

    assert_matches!(task.status, TaskStatus::Cancelled);
    assert_eq!(app.builder.calls(), 0);
    assert!(!app.path("out/series/Ghost [MULTI].torrent").exists());

    let logs = body_json(get(&app, "/api/logs").await).await;
    assert!(logs
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["level"] == "error" && e["message"].as_str().unwrap().contains("Ghost")));
}

// ---------------------------------------------------------------------------
// Test: failed task can be retried and is redispatched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retry_redispatches_failed_task() {
    let mut app = TestApp::with_builder(FakeBuilder::new(FakeMode::Fail)).await;
    app.series_source("Show.S01");
    app.start_processor();

    let ids = create(&app, json!({"category": "series", "items": [{"name": "Show.S01"}]})).await;
    assert_eq!(app.wait_finished(&ids[0]).await.status, TaskStatus::Cancelled);

    let response = post(&app, &format!("/api/tasks/{}/retry", ids[0])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let retried = body_json(response).await;
    assert_eq!(retried["status"], "running");
    assert_eq!(retried["progress"], 0);

    assert_eq!(app.wait_finished(&ids[0]).await.status, TaskStatus::Cancelled);
    assert_eq!(app.builder.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: cancelling an in-flight task stops its build
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_stops_task_in_flight() {
    let mut app = TestApp::with_builder(FakeBuilder::new(FakeMode::Hang)).await;
    app.series_source("Show.S01");
    app.start_processor();

    let ids = create(&app, json!({"category": "series", "items": [{"name": "Show.S01"}]})).await;
    app.wait_claimed(&ids[0]).await;

    let response = post(&app, &format!("/api/tasks/{}/cancel", ids[0])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "cancelled");

    app.wait_idle().await;

    // Cancelling again is a conflict.
    let again = post(&app, &format!("/api/tasks/{}/cancel", ids[0])).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Test: retrying a task that is being processed is a conflict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retry_of_in_flight_task_conflicts() {
    let mut app = TestApp::with_builder(FakeBuilder::new(FakeMode::Hang)).await;
    app.series_source("Show.S01");
    app.start_processor();

    let ids = create(&app, json!({"category": "series", "items": [{"name": "Show.S01"}]})).await;
    app.wait_claimed(&ids[0]).await;

    let response = post(&app, &format!("/api/tasks/{}/retry", ids[0])).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Test: a cancelled task cannot be retried until its build has stopped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retry_waits_for_cancelled_build_to_stop() {
    let mut app = TestApp::with_builder(FakeBuilder::new(FakeMode::SlowStop)).await;
    app.series_source("Show.S01");
    app.start_processor();

    let ids = create(&app, json!({"category": "series", "items": [{"name": "Show.S01"}]})).await;
    app.wait_claimed(&ids[0]).await;

    let cancel = post(&app, &format!("/api/tasks/{}/cancel", ids[0])).await;
    assert_eq!(cancel.status(), StatusCode::OK);

    let early = post(&app, &format!("/api/tasks/{}/retry", ids[0])).await;
    assert_eq!(early.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(early).await["code"], "CONFLICT");

    app.wait_idle().await;
    let retried = post(&app, &format!("/api/tasks/{}/retry", ids[0])).await;
    assert_eq!(retried.status(), StatusCode::OK);
    assert_matches!(
        app.state.tasks.get(&ids[0]).await.unwrap().status,
        TaskStatus::Running
    );
}

// ---------------------------------------------------------------------------
// Test: clear keeps only running tasks and is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_keeps_only_running_tasks() {
    let app = TestApp::new().await;
    let new = |name: &str| NewTask {
        name: name.into(),
        source_path: app.path("media/series").join(name),
        category: Category::Series,
        language_tag: "MULTI".into(),
    };
    let ids = app
        .state
        .tasks
        .add_many(vec![new("Done"), new("Busy"), new("Dropped")])
        .await
        .unwrap();
    assert!(app.state.tasks.mark_completed(&ids[0]).await.unwrap());
    assert!(app.state.tasks.mark_failed(&ids[2]).await.unwrap());

    let response = post(&app, "/api/tasks/clear").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], 2);

    let remaining = app.state.tasks.list().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[1]);
    assert_eq!(remaining[0].status, TaskStatus::Running);

    let again = get(&app, "/api/tasks/clear").await;
    assert_eq!(body_json(again).await["removed"], 0);
}

// ---------------------------------------------------------------------------
// Test: delete removes the task
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_task() {
    let app = TestApp::new().await;
    let ids = create(&app, json!({"category": "series", "items": [{"name": "A"}, {"name": "B"}]})).await;

    let response = post(&app, &format!("/api/tasks/{}/delete", ids[0])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let tasks = app.state.tasks.list().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, ids[1]);
    assert_eq!(
        get(&app, &format!("/api/tasks/{}", ids[0])).await.status(),
        StatusCode::NOT_FOUND
    );
}

// ---------------------------------------------------------------------------
// Test: tasks survive a restart of the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tasks_are_persisted_beside_config() {
    let app = TestApp::new().await;
    let ids = create(&app, json!({"category": "series", "items": [{"name": "A"}]})).await;

    let reopened =
        torrentforge_core::task_store::TaskStore::open(app.path("config/tasks.json")).await;
    let task = reopened.get(&ids[0]).await.unwrap();
    assert_eq!(task.name, "A");
    assert_eq!(task.status, TaskStatus::Running);
}
