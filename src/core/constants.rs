// Shared constants for the dashboard controllers

use std::time::Duration;

// Delay between two playback ticks
pub const TICK_DELAY_MS: u64 = 350;
pub const TICK_DELAY: Duration = Duration::from_millis(TICK_DELAY_MS);

pub const US_NAME: &str = "US";
pub const DEFAULT_CAPITA_SCALE: u64 = 1_000_000;

// Trajectories are aligned on the first day with at least this many cases
pub const TRAJECTORY_CASE_THRESHOLD: f64 = 100.0;

// Query string keys
pub const QUERY_COUNTRY: &str = "country";
pub const QUERY_REGION: &str = "region";
pub const QUERY_PER_CAPITA: &str = "per_capita";

// Keyboard codes used by the map slider
pub const KEY_ARROW_LEFT: u32 = 37;
pub const KEY_ARROW_RIGHT: u32 = 39;

// One-time hint flags
pub const HINT_MAP_SLIDER: &str = "shownMapSliderSnackbar";
pub const MAP_SLIDER_HINT_TEXT: &str = "Use the slider on the bottom to travel in time";

// Placeholder rendered for undefined numbers
pub const PLACEHOLDER: &str = "-";
