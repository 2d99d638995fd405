use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use std::sync::Arc;

use crate::monitor::scheduler::{SchedulerStatus, TriggerOutcome};
use crate::web::AppState;

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/trigger", post(trigger))
}

async fn get_status(State(app_state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(app_state.service.status())
}

async fn pause(State(app_state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    app_state.service.pause();
    Json(app_state.service.status())
}

async fn resume(State(app_state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    app_state.service.resume();
    Json(app_state.service.status())
}

/// Starts a sweep and responds at once; poll `/status` for its report.
async fn trigger(State(app_state): State<Arc<AppState>>) -> Json<TriggerOutcome> {
    Json(app_state.service.trigger_now())
}
