//! REST API server for event ingestion and metrics.

mod auth;
mod dashboard;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::sqlite_store::SqliteEventStore;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path to SQLite database
    pub database_path: String,
    /// API key protecting the ingest and metrics routes. When unset, the
    /// protected routes answer 500 (server misconfigured) rather than
    /// silently opening up.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: "monitor.db".to_string(),
            api_key: None,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, database_path: impl Into<String>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            database_path: database_path.into(),
            api_key: None,
        }
    }

    /// Sets the API key for protected routes
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Runs the API server
///
/// # Arguments
/// * `config` - Server configuration
///
/// # Returns
/// Returns an error if the server fails to start or encounters a fatal error
///
/// # Example
/// ```rust,no_run
/// use medical_analytics::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::default().with_api_key("secret");
///     run_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    if config.api_key.is_none() {
        tracing::warn!("ANALYTICS_API_KEY not set; protected routes will answer 500");
    }

    // Open the event store
    let store = SqliteEventStore::new(&config.database_path)?;

    // Create application state
    let state = Arc::new(AppState::new(store, config.api_key.clone()));

    // Create router
    let app = routes::create_router(state);

    // Build server address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    // Run server
    axum::serve(listener, app).await?;

    Ok(())
}
