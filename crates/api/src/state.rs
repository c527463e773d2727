use std::sync::Arc;

use crate::background::autosave::{AutosaveQueue, PgAnswerSink};
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: starthub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Debounced answer writes, keyed by (assessment, question).
    pub autosave: Arc<AutosaveQueue<PgAnswerSink>>,
}

impl AppState {
    /// Build the state, creating the auto-save queue from the configured debounce.
    pub fn new(pool: starthub_db::DbPool, config: ServerConfig) -> Self {
        let autosave = Arc::new(AutosaveQueue::new(
            PgAnswerSink::new(pool.clone()),
            config.autosave_debounce(),
        ));
        Self {
            pool,
            config: Arc::new(config),
            autosave,
        }
    }
}
