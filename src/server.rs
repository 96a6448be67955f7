//! HTTP binding for the workspace controller.
//!
//! Every route locks the controller, performs one operation and answers with
//! JSON. Errors map to status codes through [`WorkspaceError::status_code`].
//! Saves run on the controller's background writer, never inside a handler.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::config::WorkspaceConfig;
use crate::drafting::JobRequest;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::queue::{QueuePump, TaskQueue, TokioClock};
use crate::runtime::{archetypes, ClipSelection};
use crate::store::FileStateStore;
use crate::toolkit::{AngleRequest, SelectionRequest, Tool};
use crate::workspace::WorkspaceController;

/// Controller shared across request handlers.
pub type SharedController = Arc<Mutex<WorkspaceController>>;

impl WorkspaceError {
    /// HTTP status for this error.
    ///
    /// - Validation: 400 Bad Request
    /// - NotFound: 404 Not Found
    /// - GateNotSatisfied: 409 Conflict
    /// - SyncFailure: 502 Bad Gateway
    /// - everything else: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::GateNotSatisfied { .. } => StatusCode::CONFLICT,
            Self::SyncFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) | Self::Json(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WorkspaceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_operator_error() {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        } else {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PromptQuery {
    donor_id: Option<String>,
    #[serde(default)]
    instruction: String,
}

#[derive(Debug, Default, Deserialize)]
struct DraftBody {
    donor_id: Option<String>,
    #[serde(default)]
    instruction: String,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    version_id: String,
}

#[derive(Debug, Deserialize)]
struct OverrideBody {
    operator_text: String,
}

/// Toolkit or variant choice; a missing or null id clears it.
#[derive(Debug, Deserialize)]
struct ChoiceBody {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RollbackBody {
    confirmed: bool,
}

#[derive(Debug, Deserialize)]
struct MoveBody {
    delta: i64,
}

#[derive(Debug, Deserialize)]
struct EnqueueBody {
    label: String,
}

#[derive(Debug, Deserialize)]
struct CostBody {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ToolkitQuery {
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AngleOverrideBody {
    angle: String,
}

#[derive(Debug, Deserialize)]
struct ArchetypeBody {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ClipBody {
    clip_id: String,
    in_point: f64,
    out_point: f64,
}

async fn get_state(State(controller): State<SharedController>) -> Json<Value> {
    let controller = controller.lock().await;
    Json(json!(controller.state()))
}

async fn put_state(
    State(controller): State<SharedController>,
    Json(document): Json<Value>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    let state = controller.replace_state(&document)?;
    Ok(Json(json!(state)))
}

async fn submit_job(
    State(controller): State<SharedController>,
    Json(job): Json<JobRequest>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let mut controller = controller.lock().await;
    let state = controller.submit_job(job)?;
    Ok((StatusCode::CREATED, Json(json!(state))))
}

async fn get_view(State(controller): State<SharedController>) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    Ok(Json(json!(controller.view()?)))
}

async fn preview_prompt(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
    Query(query): Query<PromptQuery>,
) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    let prompt =
        controller.preview_prompt(&beat_id, query.donor_id.as_deref(), &query.instruction)?;
    Ok(Json(json!({ "prompt": prompt })))
}

async fn create_draft(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
    body: Option<Json<DraftBody>>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let mut controller = controller.lock().await;
    let version = controller
        .draft(&beat_id, body.donor_id.as_deref(), &body.instruction)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(version))))
}

async fn select_version(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
    Json(body): Json<SelectBody>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    let version = controller.select_version(&beat_id, &body.version_id)?;
    Ok(Json(json!(version)))
}

async fn override_beat(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
    Json(body): Json<OverrideBody>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let mut controller = controller.lock().await;
    let version = controller.override_beat(&beat_id, &body.operator_text)?;
    Ok((StatusCode::CREATED, Json(json!(version))))
}

async fn get_decisions(State(controller): State<SharedController>) -> Json<Value> {
    let controller = controller.lock().await;
    Json(json!(controller.decisions()))
}

async fn toggle_filter(
    State(controller): State<SharedController>,
    Path(filter_id): Path<String>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    let active = controller.toggle_filter(&filter_id)?;
    Ok(Json(
        json!({ "filter": filter_id, "active": active, "decisions": controller.decisions() }),
    ))
}

async fn set_toolkit(
    State(controller): State<SharedController>,
    Json(body): Json<ChoiceBody>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    let tool = controller.select_toolkit(body.id.as_deref().unwrap_or_default())?;
    Ok(Json(json!({ "tool": tool, "decisions": controller.decisions() })))
}

async fn set_variant(
    State(controller): State<SharedController>,
    Json(body): Json<ChoiceBody>,
) -> Json<Value> {
    let mut controller = controller.lock().await;
    controller.approve_variant(body.id.as_deref().unwrap_or_default());
    Json(json!(controller.decisions()))
}

async fn set_rollback(
    State(controller): State<SharedController>,
    Json(body): Json<RollbackBody>,
) -> Json<Value> {
    let mut controller = controller.lock().await;
    controller.confirm_rollback(body.confirmed);
    Json(json!(controller.decisions()))
}

async fn get_phase(State(controller): State<SharedController>) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    Ok(Json(json!(controller.view()?.phase)))
}

async fn move_phase(
    State(controller): State<SharedController>,
    Json(body): Json<MoveBody>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    controller.move_phase(body.delta)?;
    Ok(Json(json!(controller.view()?.phase)))
}

async fn get_queue(State(controller): State<SharedController>) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    Ok(Json(json!(controller.queue_snapshot()?)))
}

async fn enqueue(
    State(controller): State<SharedController>,
    Json(body): Json<EnqueueBody>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let mut controller = controller.lock().await;
    let task_id = controller.enqueue(&body.label)?;
    Ok((StatusCode::CREATED, Json(json!({ "taskId": task_id }))))
}

async fn get_costs(State(controller): State<SharedController>) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    Ok(Json(json!(controller.view()?.costs)))
}

async fn record_cost(
    State(controller): State<SharedController>,
    Json(body): Json<CostBody>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let mut controller = controller.lock().await;
    let entry = controller.record_call(body.input_tokens, body.output_tokens)?;
    Ok((StatusCode::CREATED, Json(json!(entry))))
}

async fn get_toolkit(
    State(controller): State<SharedController>,
    Query(query): Query<ToolkitQuery>,
) -> Json<Value> {
    let controller = controller.lock().await;
    let toolkit = controller.toolkit();
    let tools: Vec<&Tool> = match (query.category.as_deref(), query.tag.as_deref()) {
        (Some(category), Some(tag)) => toolkit
            .by_category(category)
            .into_iter()
            .filter(|tool| tool.has_tag(tag))
            .collect(),
        (Some(category), None) => toolkit.by_category(category),
        (None, Some(tag)) => toolkit.by_tag(tag),
        (None, None) => toolkit.tools().iter().collect(),
    };
    Json(json!({ "categories": toolkit.categories(), "tools": tools }))
}

async fn select_tools(
    State(controller): State<SharedController>,
    body: Option<Json<SelectionRequest>>,
) -> Json<Value> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let mut controller = controller.lock().await;
    let tools = controller.select_tools(request);
    Json(json!({ "tools": tools }))
}

async fn list_variants(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
) -> WorkspaceResult<Json<Value>> {
    let controller = controller.lock().await;
    Ok(Json(json!({ "variants": controller.variants(&beat_id)? })))
}

async fn adopt_variant(
    State(controller): State<SharedController>,
    Path((beat_id, variant_id)): Path<(String, String)>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let mut controller = controller.lock().await;
    let version = controller.adopt_variant(&beat_id, &variant_id)?;
    Ok((StatusCode::CREATED, Json(json!(version))))
}

async fn get_angles(State(controller): State<SharedController>) -> Json<Value> {
    let controller = controller.lock().await;
    Json(json!({ "angles": controller.angles() }))
}

async fn generate_angles(
    State(controller): State<SharedController>,
    body: Option<Json<AngleRequest>>,
) -> WorkspaceResult<(StatusCode, Json<Value>)> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let mut controller = controller.lock().await;
    let angles = controller.generate_angles(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "angles": angles }))))
}

async fn choose_angle(
    State(controller): State<SharedController>,
    Path(angle_id): Path<String>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    Ok(Json(json!(controller.choose_angle(&angle_id)?)))
}

async fn override_angle(
    State(controller): State<SharedController>,
    Path(angle_id): Path<String>,
    Json(body): Json<AngleOverrideBody>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    Ok(Json(json!(controller.override_angle(&angle_id, &body.angle)?)))
}

async fn list_archetypes() -> Json<Value> {
    Json(json!({ "archetypes": archetypes() }))
}

async fn apply_archetype(
    State(controller): State<SharedController>,
    Json(body): Json<ArchetypeBody>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    let state = controller.apply_archetype(&body.name)?;
    Ok(Json(json!(state)))
}

async fn set_clip(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
    Json(body): Json<ClipBody>,
) -> WorkspaceResult<Json<Value>> {
    let clip = ClipSelection::new(body.clip_id, body.in_point, body.out_point)?;
    let mut controller = controller.lock().await;
    Ok(Json(json!(controller.set_clip(&beat_id, clip)?)))
}

async fn approve_transition(
    State(controller): State<SharedController>,
    Path(beat_id): Path<String>,
) -> WorkspaceResult<Json<Value>> {
    let mut controller = controller.lock().await;
    controller.approve_transition(&beat_id)?;
    Ok(Json(json!({ "continuity": controller.continuity_notes() })))
}

async fn get_runtime(State(controller): State<SharedController>) -> Json<Value> {
    let controller = controller.lock().await;
    Json(json!({
        "summary": controller.runtime_summary(),
        "continuity": controller.continuity_notes(),
    }))
}

/// Build the router over a shared controller.
pub fn router(controller: SharedController) -> Router {
    Router::new()
        .route("/api/state", get(get_state).put(put_state).post(put_state))
        .route("/api/job", post(submit_job))
        .route("/api/view", get(get_view))
        .route("/api/beats/{beat_id}/prompt", get(preview_prompt))
        .route("/api/beats/{beat_id}/drafts", post(create_draft))
        .route("/api/beats/{beat_id}/select", post(select_version))
        .route("/api/beats/{beat_id}/override", post(override_beat))
        .route("/api/beats/{beat_id}/variants", get(list_variants))
        .route(
            "/api/beats/{beat_id}/variants/{variant_id}/adopt",
            post(adopt_variant),
        )
        .route("/api/beats/{beat_id}/clip", put(set_clip))
        .route(
            "/api/beats/{beat_id}/approve-transition",
            post(approve_transition),
        )
        .route("/api/decisions", get(get_decisions))
        .route("/api/decisions/filters/{filter_id}", post(toggle_filter))
        .route("/api/decisions/toolkit", put(set_toolkit))
        .route("/api/decisions/variant", put(set_variant))
        .route("/api/decisions/rollback", put(set_rollback))
        .route("/api/phase", get(get_phase))
        .route("/api/phase/move", post(move_phase))
        .route("/api/queue", get(get_queue).post(enqueue))
        .route("/api/costs", get(get_costs).post(record_cost))
        .route("/api/toolkit", get(get_toolkit))
        .route("/api/toolkit/select", post(select_tools))
        .route("/api/angles", get(get_angles).post(generate_angles))
        .route("/api/angles/{angle_id}/choose", post(choose_angle))
        .route("/api/angles/{angle_id}/override", post(override_angle))
        .route("/api/archetypes", get(list_archetypes))
        .route("/api/archetype", post(apply_archetype))
        .route("/api/runtime", get(get_runtime))
        .layer(TraceLayer::new_for_http())
        .with_state(controller)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Open the file-backed workspace and serve it until interrupted.
pub async fn serve(config: WorkspaceConfig) -> WorkspaceResult<()> {
    let queue = TaskQueue::new(config.queue.clone(), Arc::new(TokioClock::new())).into_shared();
    let store = Arc::new(FileStateStore::new(config.state_path.clone()));
    let controller = WorkspaceController::open(&config, store, queue.clone())?;
    let pump = QueuePump::spawn(queue, config.queue.tick());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        state_path = %config.state_path.display(),
        "Workspace server listening"
    );

    let controller = Arc::new(Mutex::new(controller));
    let app = router(Arc::clone(&controller));
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pump.shutdown().await;
    controller.lock().await.flush().await;
    result?;
    Ok(())
}
