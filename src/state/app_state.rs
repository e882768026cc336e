use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use dashboard_core::DataStore;

use crate::state::hints::HintStore;
use crate::state::view_session::SharedView;

/// Per-view defaults taken from the config file.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub default_country: String,
    pub capita_scale: u64,
    pub tick_delay: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DataStore>,
    // Maps view id -> mounted view (selection + playback)
    pub views: Arc<RwLock<HashMap<Uuid, SharedView>>>,
    pub hints: Arc<Mutex<HintStore>>,
    pub settings: Arc<ViewSettings>,
}

impl AppState {
    pub fn new(store: Arc<DataStore>, hints: HintStore, settings: ViewSettings) -> Self {
        Self {
            store,
            views: Arc::new(RwLock::new(HashMap::new())),
            hints: Arc::new(Mutex::new(hints)),
            settings: Arc::new(settings),
        }
    }

    pub async fn view(&self, id: &Uuid) -> Option<SharedView> {
        self.views.read().await.get(id).cloned()
    }
}
