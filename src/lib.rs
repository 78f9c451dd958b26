pub mod aggregate;
pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod kv;
pub mod models;
pub mod state;
pub mod store;
pub mod ui;

pub use aggregate::{count_today, today_counts};
pub use app::router;
pub use config::Config;
pub use errors::{AppError, StoreError};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use models::{Item, LogEntry};
pub use state::AppState;
pub use store::Store;
