use serde::{Deserialize, Serialize};

use dashboard_core::core::constants::{DEFAULT_CAPITA_SCALE, TICK_DELAY_MS, US_NAME};

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub id: String,
    pub version: String,
    pub description: String,
    pub connection: Connection,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub hints: HintsConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub tick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { tick_ms: TICK_DELAY_MS }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub default_country: String,
    pub capita_scale: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_country: US_NAME.to_string(),
            capita_scale: DEFAULT_CAPITA_SCALE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HintsConfig {
    pub path: String,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            path: "data/hints.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{
                "name": "covid-dashboard",
                "id": "dash",
                "version": "0.1.0",
                "description": "",
                "connection": { "ip": "127.0.0.1", "port": 0 },
                "dataset": { "path": "data/sample_dataset.json" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.playback.tick_ms, 350);
        assert_eq!(config.selection.default_country, "US");
        assert_eq!(config.selection.capita_scale, 1_000_000);
        assert_eq!(config.hints.path, "data/hints.json");
    }
}
