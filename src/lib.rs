pub mod app;
pub mod auth;
pub mod dates;
pub mod errors;
pub mod goals;
pub mod habits;
pub mod models;
pub mod progress;
pub mod state;
pub mod storage;
pub mod streak;
pub mod ui;
pub mod users;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
