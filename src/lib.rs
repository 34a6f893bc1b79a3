pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    // Arc because sea-orm's `mock` feature (used in tests) removes Clone
    // from DatabaseConnection, and axum state must be Clone.
    pub db: Arc<DatabaseConnection>,
    pub config: Config,
}
