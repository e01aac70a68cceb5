//! Shared application state for the API server

use crate::sqlite_store::SqliteEventStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite event store for persistence.
    /// Wrapped in Mutex because SQLite connections are not thread-safe.
    pub store: Arc<Mutex<SqliteEventStore>>,
    /// Expected API key for protected routes; `None` means misconfigured
    pub api_key: Option<String>,
}

impl AppState {
    /// Creates a new application state
    pub fn new(store: SqliteEventStore, api_key: Option<String>) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
            api_key,
        }
    }
}
