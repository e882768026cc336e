use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use dashboard_core::{handle_ws_stream, MetricKind, Selection};

use crate::state::app_state::AppState;
use crate::state::view_session::{ViewSession, ViewSnapshot};

#[derive(Deserialize, Debug, Default)]
pub struct MountRequest {
    /// Query string the view was opened with, e.g. `country=Italy&per_capita=1`
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CountryRequest {
    pub country: String,
}

#[derive(Deserialize, Debug)]
pub struct RegionRequest {
    #[serde(default)]
    pub region: String,
}

#[derive(Deserialize, Debug)]
pub struct PerCapitaRequest {
    pub per_capita: bool,
}

#[derive(Deserialize, Debug)]
pub struct SeekRequest {
    pub index: i64,
}

#[derive(Deserialize, Debug)]
pub struct KeyRequest {
    pub key_code: u32,
}

#[derive(Deserialize, Debug)]
pub struct DataTypeRequest {
    pub data_type: Option<MetricKind>,
}

/// =======================
/// ROUTER
/// =======================

pub fn view_routes(state: AppState) -> Router {
    Router::new()
        .route("/views", post(mount_view))
        .route("/views/{id}", get(get_view).delete(unmount_view))
        .route("/views/{id}/country", post(select_country))
        .route("/views/{id}/region", post(select_region))
        .route("/views/{id}/per-capita", post(set_per_capita))
        .route("/views/{id}/toggle", post(toggle_playback))
        .route("/views/{id}/seek", post(seek))
        .route("/views/{id}/key", post(key_press))
        .route("/views/{id}/data-type", post(set_data_type))
        .route("/views/{id}/map", get(get_map))
        .route("/views/{id}/stream", get(ws_stream))
        .with_state(state)
}

/// =======================
/// HANDLERS
/// =======================

async fn mount_view(State(state): State<AppState>, body: Option<Json<MountRequest>>) -> Response {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let query = request.query.unwrap_or_default();

    let selection = match Selection::from_query(&query, &state.settings.default_country) {
        Ok(selection) => selection,
        Err(e) => {
            debug!("Rejected view query {:?}: {}", query, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let view = ViewSession::mount(
        state.store.clone(),
        state.hints.clone(),
        selection,
        &state.settings,
    )
    .await;
    let snapshot = view.lock().await.snapshot();
    state.views.write().await.insert(snapshot.id, view);

    Json(snapshot).into_response()
}

async fn unmount_view(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(view) = state.views.write().await.remove(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    view.lock().await.unmount();
    StatusCode::NO_CONTENT.into_response()
}

async fn get_view(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    with_view(&state, id, |_| {}).await
}

async fn select_country(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CountryRequest>,
) -> Response {
    with_view(&state, id, |view| {
        view.selection.select_country(&request.country);
    })
    .await
}

async fn select_region(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RegionRequest>,
) -> Response {
    with_view(&state, id, |view| {
        view.selection.select_region(&request.region);
    })
    .await
}

async fn set_per_capita(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PerCapitaRequest>,
) -> Response {
    with_view(&state, id, |view| view.selection.set_per_capita(request.per_capita)).await
}

async fn toggle_playback(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    with_view(&state, id, |view| view.playback.toggle()).await
}

async fn seek(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SeekRequest>,
) -> Response {
    with_view(&state, id, |view| view.playback.seek(request.index)).await
}

async fn key_press(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<KeyRequest>,
) -> Response {
    with_view(&state, id, |view| {
        view.playback.handle_key(request.key_code);
    })
    .await
}

async fn set_data_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DataTypeRequest>,
) -> Response {
    with_view(&state, id, |view| match request.data_type {
        Some(kind) => view.data_type = kind,
        None => {
            view.toggle_data_type();
        }
    })
    .await
}

async fn get_map(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(view) = state.view(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let frame = view.lock().await.map();
    Json(frame).into_response()
}

async fn ws_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(view) = state.view(&id).await else {
        error!("View not found: {}", id);
        return StatusCode::NOT_FOUND.into_response();
    };
    let updates = view.lock().await.playback.subscribe();

    ws.on_upgrade(move |socket| handle_ws_stream(socket, updates, id.to_string()))
}

/// Applies `mutate` under the view lock and answers with the state read back
/// after it, so the response always reflects the latest committed change.
async fn with_view<F>(state: &AppState, id: Uuid, mutate: F) -> Response
where
    F: FnOnce(&mut ViewSession),
{
    let Some(view) = state.view(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut view = view.lock().await;
    mutate(&mut *view);
    Json(view.snapshot()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use dashboard_core::DataStore;

    use crate::state::app_state::ViewSettings;
    use crate::state::hints::HintStore;

    async fn app() -> Router {
        let path = std::env::temp_dir().join(format!("hints-{}.json", Uuid::new_v4()));
        let hints = HintStore::load(path).await.unwrap();
        let settings = ViewSettings {
            default_country: "US".to_string(),
            capita_scale: 1_000_000,
            tick_delay: Duration::from_millis(350),
        };
        view_routes(AppState::new(Arc::new(DataStore::new()), hints, settings))
    }

    fn mount_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/views")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_mount_rejects_bad_per_capita() {
        let response = app()
            .await
            .oneshot(mount_request(r#"{"query":"country=US&per_capita=maybe"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mount_accepts_query() {
        let response = app()
            .await
            .oneshot(mount_request(r#"{"query":"country=US&per_capita=1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_view_is_not_found() {
        let id = Uuid::new_v4();
        let app = app().await;

        let get = Request::builder()
            .uri(format!("/views/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let toggle = Request::builder()
            .method("POST")
            .uri(format!("/views/{}/toggle", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(toggle).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/views/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
