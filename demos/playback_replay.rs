// Replays the sample dataset on a virtual clock and prints each map frame

use dashboard_core::core::constants::TICK_DELAY;
use dashboard_core::core::map_view::map_frame;
use dashboard_core::core::metrics::format_rate;
use dashboard_core::{DataStore, ManualScheduler, MetricKind, PlaybackController, Result};
use tracing::{info, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let store = DataStore::new();
    store.load_file("data/sample_dataset.json").await?;
    let Some(dataset) = store.dataset() else {
        return Ok(());
    };

    let mut playback = PlaybackController::new(ManualScheduler::new(), TICK_DELAY);
    playback.observe_len(dataset.dates().len());
    playback.toggle();

    loop {
        let frame = map_frame(Some(&dataset), playback.state(), MetricKind::Confirmed);
        info!(
            "{:?} confirmed={:?} deaths={:?} mortality={}",
            frame.date,
            frame.world_confirmed,
            frame.world_deaths,
            format_rate(frame.world_mortality_rate)
        );

        if !playback.is_playing() {
            break;
        }
        for id in playback.scheduler_mut().advance(TICK_DELAY) {
            playback.on_tick(id);
        }
    }

    Ok(())
}
