//! Application state management

use super::ServerConfig;
use crate::artifacts::ModelLoader;
use std::sync::Arc;

/// State shared across request handlers.
///
/// The loader is bound once at startup and never mutated afterwards, so
/// handlers read it without locking. `None` means the server is running
/// degraded with no artifacts available.
pub struct AppState {
    pub config: ServerConfig,
    pub loader: Option<Arc<ModelLoader>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, loader: Option<Arc<ModelLoader>>) -> Self {
        Self {
            config,
            loader,
            started_at: chrono::Utc::now(),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.loader.is_some()
    }
}
