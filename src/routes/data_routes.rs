use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use dashboard_core::core::metrics::per_capita_label;
use dashboard_core::core::selection::RegionRow;
use dashboard_core::core::trajectory::{last_point_time, trajectories, TrajectoryPoint};
use dashboard_core::MetricKind;

use crate::state::app_state::AppState;

#[derive(Deserialize, Debug)]
pub struct TrajectoryQuery {
    #[serde(default)]
    pub kind: MetricKind,
    /// Comma separated country names
    #[serde(default)]
    pub countries: String,
    #[serde(default)]
    pub per_capita: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TrajectoryResponse {
    pub kind: MetricKind,
    pub caption: Option<String>,
    pub rows: Vec<TrajectoryPoint>,
    pub last_points: BTreeMap<String, usize>,
}

/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/trajectories", get(get_trajectories))
        .route("/regions/{country}", get(get_regions))
        .with_state(state)
}

/// =======================
/// HANDLERS
/// =======================

async fn get_trajectories(State(state): State<AppState>, Query(query): Query<TrajectoryQuery>) -> Response {
    let Some(dataset) = state.store.dataset() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let per_capita = matches!(query.per_capita.as_deref(), Some("1") | Some("true"));
    let countries: Vec<String> = query
        .countries
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    debug!("Trajectories: kind={} countries={:?} per_capita={}", query.kind, countries, per_capita);

    let scale = state.settings.capita_scale;
    let rows = trajectories(&dataset, query.kind, &countries, per_capita, scale);
    let last_points = countries
        .iter()
        .filter_map(|c| last_point_time(&rows, c).map(|t| (c.clone(), t)))
        .collect();

    Json(TrajectoryResponse {
        kind: query.kind,
        caption: per_capita.then(|| per_capita_label(scale)),
        rows,
        last_points,
    })
    .into_response()
}

async fn get_regions(State(state): State<AppState>, Path(country): Path<String>) -> Response {
    let Some(dataset) = state.store.dataset() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    if !dataset.is_country(&country) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let rows: Vec<RegionRow> = dataset
        .possible_regions_by_country(&country)
        .iter()
        .map(|region| RegionRow {
            region: region.clone(),
            cases: dataset.last_region_cases(region),
            deaths: dataset.last_region_deaths(region),
        })
        .collect();

    Json(rows).into_response()
}
