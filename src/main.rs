use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber;

mod models;
mod routes;
mod state;
mod utils;

use crate::state::app_state::{AppState, ViewSettings};
use crate::state::hints::HintStore;
use crate::utils::conf_helper::{get_cached_config, init_config_and_bind};
use dashboard_core::DataStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // === CONFIG + LISTENER ===
    let listener = init_config_and_bind().await?;

    let config = get_cached_config();

    info!(
        "Server initialized on {}:{}",
        config.connection.ip,
        config.connection.port
    );

    let hints = HintStore::load(&config.hints.path).await?;
    let store = Arc::new(DataStore::new());

    let settings = ViewSettings {
        default_country: config.selection.default_country.clone(),
        capita_scale: config.selection.capita_scale,
        tick_delay: Duration::from_millis(config.playback.tick_ms),
    };
    let state = AppState::new(store.clone(), hints, settings);

    // views observe readiness; the server answers while the dataset loads
    let dataset_path = config.dataset.path.clone();
    tokio::spawn(async move {
        match store.load_file(&dataset_path).await {
            Ok(()) => info!("Dataset loaded from {}", dataset_path),
            Err(e) => error!("Dataset load failed for {}: {}", dataset_path, e),
        }
    });

    let app = Router::new()
        .merge(routes::info_routes::health_routes(state.clone()))
        .merge(routes::view_routes::view_routes(state.clone()))
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;

    Ok(())
}
