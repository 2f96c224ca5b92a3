//! authgate - registration and token authentication service

use authgate::{api, core, db};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting authgate v{}", authgate::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        pool_size = config.database.connection_pool_size,
        "Database configuration"
    );
    info!(
        token_ttl_minutes = config.security.token_ttl_minutes,
        bcrypt_cost = config.security.bcrypt_cost,
        "Security configuration"
    );

    info!("Initializing database...");
    let db = Arc::new(db::DatabaseManager::from_config(&config.database)?);
    info!("Database initialized successfully");

    let server = api::ApiServer::new(&config, db)?;
    server.serve().await?;

    Ok(())
}
