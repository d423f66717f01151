//! REST serving
//!
//! Binds the configured model kind from the artifact store at startup and
//! serves single and batch predictions. A failed bind leaves the server
//! running in a degraded state that the health probe reports; the store can
//! be retrained and the server restarted to pick up fresh artifacts.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::artifacts::{ArtifactStore, ModelLoader};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Default model kind the server binds when MODEL_KIND is unset
pub const DEFAULT_MODEL_KIND: &str = "random_forest";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: String,
    pub model_kind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            models_dir: std::env::var("MODELS_DIR").unwrap_or_else(|_| "./models".to_string()),
            model_kind: std::env::var("MODEL_KIND")
                .unwrap_or_else(|_| DEFAULT_MODEL_KIND.to_string()),
        }
    }
}

/// Resolve a loader for the configured kind. Returns `None` (degraded) when
/// no artifacts are available yet.
fn bind_loader(config: &ServerConfig) -> Option<ModelLoader> {
    let store = ArtifactStore::new(&config.models_dir);
    let mut loader = ModelLoader::new(store, &config.model_kind);
    match loader.resolve() {
        Ok(_) => {
            info!(
                kind = %config.model_kind,
                model = ?loader.model_path(),
                "model bound"
            );
            Some(loader)
        }
        Err(e) => {
            warn!(
                kind = %config.model_kind,
                models_dir = %config.models_dir,
                error = %e,
                "no model could be bound; serving in degraded state"
            );
            None
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let loader = bind_loader(&config).map(Arc::new);
    let state = Arc::new(AppState::new(config.clone(), loader));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        models_dir = %config.models_dir,
        model_kind = %config.model_kind,
        started_at = %start_time.to_rfc3339(),
        "server listening"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C handler");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("server shut down cleanly");
    Ok(())
}
