//! Estado compartilhado entre os handlers

use crate::config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Estado da aplicação injetado em todos os handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
