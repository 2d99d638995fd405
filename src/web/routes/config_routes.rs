use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::notifications::models::{ConfigUpdate, ConfigView};
use crate::web::{AppError, AppState};

pub fn create_config_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_config).put(save_config))
        .route("/test", post(test_channel))
}

async fn get_config(State(app_state): State<Arc<AppState>>) -> Json<ConfigView> {
    Json(app_state.service.config_view())
}

async fn save_config(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ConfigUpdate>,
) -> Result<Json<ConfigView>, AppError> {
    Ok(Json(app_state.service.save_config(payload)?))
}

async fn test_channel(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    app_state.service.test_channel().await?;
    Ok(StatusCode::NO_CONTENT)
}
