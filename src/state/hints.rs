use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use dashboard_core::core::constants::{HINT_MAP_SLIDER, MAP_SLIDER_HINT_TEXT};
use dashboard_core::Result;

/// One-time UI hint flags, persisted as a flat JSON object.
#[derive(Debug)]
pub struct HintStore {
    path: PathBuf,
    flags: BTreeMap<String, bool>,
}

impl HintStore {
    /// A missing file is an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let flags = match fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, flags })
    }

    pub fn get(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub async fn set(&mut self, key: &str, value: bool) -> Result<()> {
        self.flags.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&self.flags)?).await?;
        debug!("hint flag {} = {}", key, value);
        Ok(())
    }

    /// True only the first time it is called for `key`.
    pub async fn show_once(&mut self, key: &str) -> Result<bool> {
        if self.get(key) {
            return Ok(false);
        }
        self.set(key, true).await?;
        Ok(true)
    }
}

/// The map slider hint text, the first time the dataset is seen ready.
pub async fn offer_slider_hint(hints: &Mutex<HintStore>) -> Option<&'static str> {
    match hints.lock().await.show_once(HINT_MAP_SLIDER).await {
        Ok(true) => {
            info!("{}", MAP_SLIDER_HINT_TEXT);
            Some(MAP_SLIDER_HINT_TEXT)
        }
        Ok(false) => None,
        Err(e) => {
            error!("Failed to persist hint flag: {}", e);
            None
        }
    }
}
