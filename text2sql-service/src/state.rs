//! Application state for the text-to-SQL service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::session::SessionManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub session: Arc<SessionManager>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: Arc::new(SessionManager::new(config.clone())),
            config,
        }
    }
}
