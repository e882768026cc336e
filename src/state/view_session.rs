use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use dashboard_core::core::map_view::{map_frame, MapFrame};
use dashboard_core::core::selection::DashboardSummary;
use dashboard_core::{
    DataStore, Dataset, MetricKind, PlaybackController, PlaybackState, Selection, SelectionController,
    TickId, TokioTickScheduler,
};

use crate::state::app_state::ViewSettings;
use crate::state::hints::{offer_slider_hint, HintStore};

pub type SharedView = Arc<Mutex<ViewSession>>;

/// Everything one mounted dashboard/map view owns. Dropped on unmount.
pub struct ViewSession {
    pub id: Uuid,
    pub selection: SelectionController,
    pub playback: PlaybackController<TokioTickScheduler>,
    pub data_type: MetricKind,
    /// One-time hint shown to this view, if it was the first to see the dataset ready
    pub hint: Option<&'static str>,
    hint_checked: bool,
    store: Arc<DataStore>,
    tasks: Vec<JoinHandle<()>>,
}

#[derive(Debug, Serialize)]
pub struct ViewSnapshot {
    pub id: Uuid,
    pub dashboard: DashboardSummary,
    pub playback: PlaybackState,
    pub map: MapFrame,
    pub hint: Option<&'static str>,
}

impl ViewSession {
    pub async fn mount(
        store: Arc<DataStore>,
        hints: Arc<Mutex<HintStore>>,
        selection: Selection,
        settings: &ViewSettings,
    ) -> SharedView {
        let id = Uuid::new_v4();
        let (scheduler, ticks) = TokioTickScheduler::new();
        let loaded = store.subscribe();

        let mut playback = PlaybackController::new(scheduler, settings.tick_delay);
        if let Some(dataset) = store.dataset() {
            playback.observe_len(dataset.dates().len());
        }

        let selection = SelectionController::restore(
            store.clone(),
            selection,
            &settings.default_country,
            settings.capita_scale,
        );

        let hint_checked = store.ready();
        let hint = if hint_checked {
            offer_slider_hint(&hints).await
        } else {
            None
        };

        let view = Arc::new(Mutex::new(Self {
            id,
            selection,
            playback,
            data_type: MetricKind::Confirmed,
            hint,
            hint_checked,
            store,
            tasks: Vec::new(),
        }));

        let pump = tokio::spawn(pump_ticks(Arc::downgrade(&view), ticks));
        let watcher = tokio::spawn(follow_dataset(Arc::downgrade(&view), hints, loaded));
        view.lock().await.tasks.extend([pump, watcher]);

        info!("View mounted: {}", id);
        view
    }

    /// Cancels the pending tick and the background tasks.
    pub fn unmount(&mut self) {
        self.playback.shutdown();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("View unmounted: {}", self.id);
    }

    pub fn toggle_data_type(&mut self) -> MetricKind {
        self.data_type = self.data_type.toggled();
        self.data_type
    }

    pub fn map(&self) -> MapFrame {
        let dataset = self.store.dataset();
        map_frame(dataset.as_deref(), self.playback.state(), self.data_type)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            id: self.id,
            dashboard: self.selection.dashboard(),
            playback: self.playback.state(),
            map: self.map(),
            hint: self.hint,
        }
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn pump_ticks(view: Weak<Mutex<ViewSession>>, mut ticks: mpsc::UnboundedReceiver<TickId>) {
    while let Some(id) = ticks.recv().await {
        let Some(view) = view.upgrade() else {
            break;
        };
        let mut view = view.lock().await;
        view.playback.on_tick(id);
        debug!("view {} tick -> {:?}", view.id, view.playback.state());
    }
}

/// Keeps playback bounds and the selection in line with each installed
/// dataset, and offers the slider hint the first time one shows up.
async fn follow_dataset(
    view: Weak<Mutex<ViewSession>>,
    hints: Arc<Mutex<HintStore>>,
    mut loaded: watch::Receiver<Option<Arc<Dataset>>>,
) {
    while loaded.changed().await.is_ok() {
        let dataset = loaded.borrow_and_update().clone();
        let Some(view) = view.upgrade() else {
            break;
        };

        let offer_hint = {
            let mut view = view.lock().await;
            let len = dataset.as_ref().map(|dataset| dataset.dates().len()).unwrap_or(0);
            view.playback.observe_len(len);

            match &dataset {
                Some(dataset) => {
                    if view.selection.reconcile(dataset) {
                        debug!("view {} selection -> {:?}", view.id, view.selection.selection());
                    }
                    let offer = !view.hint_checked;
                    view.hint_checked = true;
                    offer
                }
                None => false,
            }
        };

        if offer_hint {
            let hint = offer_slider_hint(&hints).await;
            view.lock().await.hint = hint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::core::constants::MAP_SLIDER_HINT_TEXT;
    use dashboard_core::core::format::{CountrySnapshot, DatasetSnapshot, EntitySeries};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn settings() -> ViewSettings {
        ViewSettings {
            default_country: "US".to_string(),
            capita_scale: 1_000_000,
            tick_delay: Duration::from_millis(350),
        }
    }

    async fn hints() -> Arc<Mutex<HintStore>> {
        let path = std::env::temp_dir().join(format!("hints-{}.json", Uuid::new_v4()));
        Arc::new(Mutex::new(HintStore::load(path).await.unwrap()))
    }

    fn dataset(days: usize) -> Dataset {
        let values: Vec<Option<f64>> = (0..days).map(|d| Some(d as f64 * 100.0)).collect();
        let mut countries = BTreeMap::new();
        countries.insert(
            "US".to_string(),
            CountrySnapshot {
                population: Some(1_000),
                confirmed: EntitySeries::new(values.clone()),
                dead: EntitySeries::new(values),
                regions: BTreeMap::new(),
            },
        );
        let dates = (0..days)
            .map(|d| format!("2020-03-{:02}", d + 1))
            .collect();
        Dataset::from_snapshot(DatasetSnapshot { dates, countries }).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_runs_on_real_timer() {
        let store = Arc::new(DataStore::with_dataset(dataset(4)));
        let view = ViewSession::mount(store, hints().await, Selection::new("US"), &settings()).await;
        assert_eq!(view.lock().await.playback.state().current_index, 3);

        view.lock().await.playback.toggle();
        let mut updates = view.lock().await.playback.subscribe();

        while updates.changed().await.is_ok() {
            if !updates.borrow_and_update().playing {
                break;
            }
        }

        let state = view.lock().await.playback.state();
        assert_eq!(state, PlaybackState { current_index: 3, max_index: 3, playing: false });
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_follows_late_dataset_load() {
        let store = Arc::new(DataStore::new());
        let view = ViewSession::mount(store.clone(), hints().await, Selection::new("US"), &settings()).await;
        assert_eq!(view.lock().await.playback.state().max_index, 0);

        store.install(dataset(5));
        tokio::time::sleep(Duration::from_millis(1)).await;

        let state = view.lock().await.playback.state();
        assert_eq!(state.max_index, 4);
        assert_eq!(state.current_index, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_playback() {
        let store = Arc::new(DataStore::with_dataset(dataset(10)));
        let view = ViewSession::mount(store, hints().await, Selection::new("US"), &settings()).await;
        view.lock().await.playback.toggle();
        view.lock().await.unmount();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = view.lock().await.playback.state();
        assert_eq!(state.current_index, 0);
        assert!(!state.playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_dataset_load_reconciles_selection() {
        let store = Arc::new(DataStore::new());
        let restored = Selection::from_query("country=Atlantis&region=Nowhere", "US").unwrap();
        let view = ViewSession::mount(store.clone(), hints().await, restored, &settings()).await;
        assert!(view.lock().await.selection.current_row_data().is_none());

        store.install(dataset(3));
        tokio::time::sleep(Duration::from_millis(1)).await;

        let view = view.lock().await;
        assert_eq!(view.selection.selection(), Selection::new("US"));
        assert!(view.selection.current_row_data().is_some());
    }

    #[tokio::test]
    async fn test_slider_hint_when_dataset_arrives_after_mount() {
        let store = Arc::new(DataStore::new());
        let hints = hints().await;
        let view = ViewSession::mount(store.clone(), hints.clone(), Selection::new("US"), &settings()).await;
        assert_eq!(view.lock().await.hint, None);

        store.install(dataset(3));
        for _ in 0..200 {
            if view.lock().await.hint.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(view.lock().await.snapshot().hint, Some(MAP_SLIDER_HINT_TEXT));

        // a later mount does not repeat it
        let second = ViewSession::mount(store, hints, Selection::new("US"), &settings()).await;
        assert_eq!(second.lock().await.hint, None);
    }
}
