use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::monitor::models::{BatchResult, TargetSummary, WatchedTarget};
use crate::web::models::{CheckResponse, CreateTarget, RemoveTargets, RemovedCount};
use crate::web::{AppError, AppState};

pub fn create_target_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_targets).post(create_target))
        .route("/batch", post(create_targets_batch))
        .route("/remove", post(remove_targets))
        .route("/summary", get(get_summary))
        // Path ids are percent-decoded, so `a%2Fb` addresses identity `a/b`.
        .route("/{id}", delete(delete_target))
        .route("/{id}/check", post(check_target))
}

async fn list_targets(State(app_state): State<Arc<AppState>>) -> Json<Vec<WatchedTarget>> {
    Json(app_state.service.list_targets())
}

async fn create_target(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTarget>,
) -> Result<StatusCode, AppError> {
    app_state
        .service
        .add_target(&payload.identity, &payload.locator)?;
    Ok(StatusCode::CREATED)
}

/// Body is plain text, one `identity|locator` record per line.
async fn create_targets_batch(
    State(app_state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<BatchResult>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::InvalidInput("Batch input is empty".to_string()));
    }
    Ok(Json(app_state.service.add_targets_batch(&body)?))
}

async fn remove_targets(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RemoveTargets>,
) -> Result<Json<RemovedCount>, AppError> {
    let removed = app_state.service.remove_targets(&payload.identities)?;
    Ok(Json(RemovedCount { removed }))
}

async fn get_summary(State(app_state): State<Arc<AppState>>) -> Json<TargetSummary> {
    Json(app_state.service.summary())
}

async fn delete_target(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if app_state.service.remove_target(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Target not found: {id}")))
    }
}

async fn check_target(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckResponse>, AppError> {
    let check = app_state.service.check_target(&id).await?;
    Ok(Json(check.into()))
}
