//! Medical Analytics Monitor Server Binary
//!
//! Run with: `cargo run --bin monitor-server`

use medical_analytics::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Note: Tracing is initialized in run_server()
    // Set RUST_LOG environment variable to control log level:
    //   RUST_LOG=debug cargo run --bin monitor-server

    // Create configuration from environment variables or defaults
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "monitor.db".to_string());

    let mut config = ServerConfig::new(host, port, database_path);
    if let Ok(api_key) = std::env::var("ANALYTICS_API_KEY") {
        config = config.with_api_key(api_key);
    }

    println!("Starting Medical Analytics Monitor...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Database: {}", config.database_path);
    println!(
        "   API key: {}",
        if config.api_key.is_some() {
            "configured"
        } else {
            "NOT SET (protected routes will answer 500)"
        }
    );
    println!();
    println!(
        "Server will be available at: http://{}:{}",
        config.host, config.port
    );
    println!();
    println!("Available endpoints:");
    println!("  GET  /ping                      - Health check");
    println!("  POST /events                    - Ingest one event (API key)");
    println!("  POST /events/bulk               - Ingest a batch (API key)");
    println!("  GET  /events                    - List raw events (API key)");
    println!("  GET  /metrics/summary           - Windowed metrics (API key)");
    println!("  GET  /public/metrics/summary    - Public aggregate summary");
    println!("  GET  /dashboard                 - Public HTML dashboard");
    println!();

    // Run server
    run_server(config).await?;

    Ok(())
}
