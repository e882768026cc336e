// COVID-19 dashboard core
// Selection, playback and derived metrics behind the dashboard views

pub mod core;

// Re-export main types
pub use core::error::{DashboardError, Result};
pub use core::format::{EntitySeries, MetricKind, RowData};
pub use core::store::{DataStore, Dataset};
pub use core::selection::{Selection, SelectionController};
pub use core::playback::{PlaybackController, PlaybackState};
pub use core::timer::{ManualScheduler, TickId, TickScheduler, TokioTickScheduler};
pub use core::data_handle::handle_ws_stream;

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(TICK_DELAY.as_millis(), 350);
        assert_eq!((KEY_ARROW_LEFT, KEY_ARROW_RIGHT), (37, 39));
    }
}
