pub mod compression;
pub mod constants;
pub mod data_handle;
pub mod error;
pub mod format;
pub mod map_view;
pub mod metrics;
pub mod playback;
pub mod selection;
pub mod store;
pub mod timer;
pub mod trajectory;
