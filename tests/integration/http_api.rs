//! Integration tests for the JSON HTTP binding
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`;
//! no socket is opened.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use draftdesk::queue::{ManualClock, QueueConfig, TaskQueue};
use draftdesk::server::{router, SharedController};
use draftdesk::store::{FileStateStore, MemoryStateStore, StateStore};
use draftdesk::WorkspaceController;

struct TestApp {
    router: Router,
    controller: SharedController,
    clock: ManualClock,
}

impl TestApp {
    /// Wait for queued saves to reach the store.
    async fn flush(&self) {
        self.controller.lock().await.flush().await;
    }
}

fn app_with_store(store: Arc<dyn StateStore>) -> TestApp {
    let clock = ManualClock::new();
    let queue = TaskQueue::new(QueueConfig::default(), Arc::new(clock.clone())).into_shared();
    let controller: SharedController = Arc::new(Mutex::new(WorkspaceController::new(store, queue)));
    TestApp {
        router: router(Arc::clone(&controller)),
        controller,
        clock,
    }
}

fn app() -> Router {
    app_with_store(Arc::new(MemoryStateStore::new())).router
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn submit_job(app: &Router) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/job",
        Some(json!({
            "beats": [
                {"id": "b1", "title": "Opening", "text": "Intro text",
                 "rejectedOptions": [{"id": "d1", "name": "Noir", "text": "Rain on neon."}]},
                {"id": "b2", "title": "Turn", "text": "Second beat"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_state() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"beats": []}));
}

#[tokio::test]
async fn test_put_state_validates_before_replacing() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("workspace_state.json");
    let test_app = app_with_store(Arc::new(FileStateStore::new(&path)));
    let app = &test_app.router;

    let (status, _) = send(
        app,
        Method::PUT,
        "/api/state",
        Some(json!({"beats": [{"id": "b1", "text": "Kept"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    test_app.flush().await;
    let saved = std::fs::read_to_string(&path).expect("state file");

    let (status, body) = send(app, Method::POST, "/api/state", Some(json!({"beats": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Validation error"));
    test_app.flush().await;
    assert_eq!(std::fs::read_to_string(&path).expect("state file"), saved);

    let (_, state) = send(app, Method::GET, "/api/state", None).await;
    assert_eq!(state["beats"][0]["baseline"], "Kept");
}

#[tokio::test]
async fn test_prompt_preview_and_draft_selection() {
    let app = app();
    submit_job(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/beats/b1/prompt", None).await;
    assert_eq!(status, StatusCode::OK);
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("Intro text"));
    assert!(prompt.contains("Use baseline tone only."));
    assert!(prompt.contains("None provided."));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/beats/b1/prompt?donor_id=d1&instruction=Tighter",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prompt"].as_str().unwrap().contains("Donor style (Noir):"));

    let (status, first) = send(&app, Method::POST, "/api/beats/b1/drafts", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let first_id = first["id"].as_str().unwrap().to_string();

    let (status, second) = send(
        &app,
        Method::POST,
        "/api/beats/b1/drafts",
        Some(json!({"donor_id": "d1", "instruction": "Tighter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["sourceOption"], "Noir");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/beats/b1/select",
        Some(json!({"version_id": first_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = send(&app, Method::GET, "/api/view", None).await;
    let versions = view["beats"][0]["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["id"], second["id"]);
    assert_eq!(versions[1]["isSelected"], true);
    assert_eq!(view["beats"][1]["context"], first["text"]);
    assert_eq!(view["costs"]["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let app = app();
    submit_job(&app).await;

    let (status, _) = send(&app, Method::POST, "/api/beats/zzz/drafts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/beats/b1/drafts",
        Some(json!({"donor_id": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/beats/b1/select",
        Some(json!({"version_id": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "version not found: missing");
}

#[tokio::test]
async fn test_override_rejects_blank_text() {
    let app = app();
    submit_job(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/beats/b1/override",
        Some(json!({"operator_text": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/beats/b1/override",
        Some(json!({"operator_text": "Written by hand."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sourceOption"], "operator");
}

#[tokio::test]
async fn test_phase_gate_over_http() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/phase/move", Some(json!({"delta": 1}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("filters"));

    let (status, _) = send(&app, Method::POST, "/api/decisions/filters/f1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, Method::POST, "/api/decisions/filters/satire", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);
    let (status, phase) = send(&app, Method::POST, "/api/phase/move", Some(json!({"delta": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase["current"], "toolkit");
    assert_eq!(phase["nextEnabled"], false);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/decisions/toolkit",
        Some(json!({"id": "t1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/decisions/toolkit",
        Some(json!({"id": "satire-010"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool"]["name"], "Satire Tool 010");
    assert_eq!(body["decisions"]["toolkit"], "satire-010");

    let (_, phase) = send(&app, Method::GET, "/api/phase", None).await;
    assert_eq!(phase["canAdvance"], true);

    let (status, phase) = send(&app, Method::POST, "/api/phase/move", Some(json!({"delta": -1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(phase["current"], "filters");
    assert_eq!(phase["canGoBack"], false);
}

#[tokio::test]
async fn test_queue_lifecycle_over_http() {
    let TestApp { router: app, clock, .. } = app_with_store(Arc::new(MemoryStateStore::new()));

    let (status, body) = send(&app, Method::POST, "/api/queue", Some(json!({"label": "Run 1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["taskId"].is_string());

    let (_, queue) = send(&app, Method::GET, "/api/queue", None).await;
    assert_eq!(queue["busy"], true);
    assert_eq!(queue["tasks"][0]["status"], "waiting");

    clock.advance(std::time::Duration::from_millis(300));
    let (_, queue) = send(&app, Method::GET, "/api/queue", None).await;
    assert_eq!(queue["tasks"][0]["status"], "running");

    clock.advance(std::time::Duration::from_millis(2_300));
    let (_, queue) = send(&app, Method::GET, "/api/queue", None).await;
    assert_eq!(queue["tasks"][0]["status"], "done");
    assert_eq!(queue["busy"], false);
}

#[tokio::test]
async fn test_costs_over_http() {
    let app = app();

    let (status, entry) = send(
        &app,
        Method::POST,
        "/api/costs",
        Some(json!({"input_tokens": 1000, "output_tokens": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["inputTokens"], 1000);

    let (_, costs) = send(&app, Method::GET, "/api/costs", None).await;
    assert_eq!(costs["totals"]["totalInput"], 1000);
    assert_eq!(costs["formattedTotal"], "$0.0180");
}

#[tokio::test]
async fn test_costs_reject_overflow() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/costs",
        Some(json!({"input_tokens": u64::MAX, "output_tokens": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/costs",
        Some(json!({"input_tokens": 1, "output_tokens": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("overflow"));
}

#[tokio::test]
async fn test_blank_filter_is_rejected() {
    let app = app();
    let (status, _) = send(&app, Method::POST, "/api/decisions/filters/%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, decisions) = send(&app, Method::GET, "/api/decisions", None).await;
    assert_eq!(decisions["filters"], json!([]));
}

#[tokio::test]
async fn test_toolkit_catalog_and_selection() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/toolkit?category=Lighting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"].as_array().unwrap().len(), 22);
    assert_eq!(body["tools"].as_array().unwrap().len(), 14);

    let (_, body) = send(&app, Method::GET, "/api/toolkit?tag=satire", None).await;
    let tools = body["tools"].as_array().unwrap();
    assert!(tools.iter().all(|tool| tool["category"] == "Satire"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/toolkit/select",
        Some(json!({"tags": ["wordplay"], "limit": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[0]["category"], "Wordplay");

    let (_, state) = send(&app, Method::GET, "/api/state", None).await;
    assert_eq!(state["toolkitSelection"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_angles_over_http() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/angles",
        Some(json!({"role": "Host", "context": "A product launch", "count": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let angles = body["angles"].as_array().unwrap();
    assert_eq!(angles.len(), 2);
    assert!(angles[0]["angle"].as_str().unwrap().starts_with("Have Host lean on"));
    let id = angles[0]["id"].as_str().unwrap().to_string();

    let (status, angle) = send(&app, Method::POST, &format!("/api/angles/{}/choose", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(angle["status"], "selected");

    let uri = format!("/api/angles/{}/override", id);
    let (status, _) = send(&app, Method::POST, &uri, Some(json!({"angle": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, angle) = send(&app, Method::POST, &uri, Some(json!({"angle": "Unbox it in silence."}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(angle["status"], "overridden");

    let (status, _) = send(&app, Method::POST, "/api/angles/ghost/choose", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, decisions) = send(&app, Method::GET, "/api/decisions", None).await;
    assert_eq!(decisions["approvedVariant"], json!(id));
}

#[tokio::test]
async fn test_variants_over_http() {
    let app = app();
    submit_job(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/beats/b2/variants", None).await;
    assert_eq!(status, StatusCode::OK);
    let variants = body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 3);
    assert_eq!(variants[2]["kind"], "wildcard");
    assert!(variants[0]["systemPrompt"].as_str().unwrap().contains("Intro text"));

    let (status, version) = send(&app, Method::POST, "/api/beats/b2/variants/v2/adopt", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(version["sourceOption"], "variant:tool_heavy");

    let (status, _) = send(&app, Method::POST, "/api/beats/b2/variants/v7/adopt", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_archetype_clip_and_runtime_over_http() {
    let test_app = app_with_store(Arc::new(MemoryStateStore::new()));
    let app = &test_app.router;

    let (_, body) = send(app, Method::GET, "/api/archetypes", None).await;
    assert_eq!(body["archetypes"].as_array().unwrap().len(), 3);

    let (status, _) = send(app, Method::POST, "/api/archetype", Some(json!({"name": "Saga"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, state) = send(
        app,
        Method::POST,
        "/api/archetype",
        Some(json!({"name": "Conflict & Resolution"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["beats"].as_array().unwrap().len(), 4);
    assert_eq!(state["archetype"], "Conflict & Resolution");

    let (status, _) = send(
        app,
        Method::PUT,
        "/api/beats/clip/clip",
        Some(json!({"clip_id": "storm", "in_point": 50.0, "out_point": 20.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, clip) = send(
        app,
        Method::PUT,
        "/api/beats/clip/clip",
        Some(json!({"clip_id": "storm", "in_point": 0.0, "out_point": 960.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clip["clipId"], "storm");

    let (_, runtime) = send(app, Method::GET, "/api/runtime", None).await;
    assert_eq!(runtime["summary"]["budgetSecs"], 900.0);
    assert_eq!(runtime["summary"]["beats"][1]["overBudget"], true);
    let notes = runtime["continuity"].as_array().unwrap();
    assert!(notes.iter().any(|note| note.as_str().unwrap().starts_with("Setup text is empty")));

    let (status, body) = send(app, Method::POST, "/api/beats/clip/approve-transition", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["continuity"]
        .as_array()
        .unwrap()
        .iter()
        .any(|note| note.as_str().unwrap().starts_with("Operator gate pending")));

    test_app.flush().await;
    let view = test_app.controller.lock().await.view().unwrap();
    assert!(view.sync_failures.is_empty());
    assert!(view.beats[1].transition_approved);
}
