pub mod app_state;
pub mod hints;
pub mod view_session;
