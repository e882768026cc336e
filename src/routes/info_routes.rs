use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use serde::Serialize;
use tracing::debug;

use crate::state::app_state::AppState;

pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info_check))
        .with_state(state)
}

pub async fn info_check() -> Response {
    let config = crate::utils::conf_helper::get_cached_config();

    debug!("{} requested", config.name);
    Json(config).into_response()
}

async fn health_check(State(state): State<AppState>) -> Response {
    let views = state.views.read().await.len();

    if state.store.ready() {
        Json(HealthStatus {
            status: "ok".to_owned(),
            dataset_ready: true,
            views,
        })
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "loading".to_owned(),
                dataset_ready: false,
                views,
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
    dataset_ready: bool,
    views: usize,
}
