pub mod app;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod sanitize;
pub mod state;
pub mod store;

pub use app::app;
pub use config::AppConfig;
pub use state::AppState;
