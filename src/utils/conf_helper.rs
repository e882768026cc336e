use anyhow::{Context, Result};
use std::sync::OnceLock;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;

use crate::models::dashboard_config::DashboardConfig;

static CONFIG_CACHE: OnceLock<DashboardConfig> = OnceLock::new();

const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "dashboard.json";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub async fn load_config(file_path: &str) -> Result<DashboardConfig> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("Failed to read config file: {file_path}"))?;

    serde_json::from_str(&data).with_context(|| format!("Failed to parse config file: {file_path}"))
}

pub async fn init_config_and_bind() -> Result<TcpListener> {
    let mut config = load_config(&config_path()).await?;

    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Bind failed: {bind_addr}"))?;

    let actual_port = listener.local_addr().context("Addr error")?.port();

    // port 0 in the file means "any free port"
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow::anyhow!("Config already initialized"))?;

    info!("Config initialized with port: {}", actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> &'static DashboardConfig {
    CONFIG_CACHE.get().expect("Config not initialized")
}
