pub mod actions;
pub mod app;
pub mod auth;
pub mod buckets;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schedule;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
