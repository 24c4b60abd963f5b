mod analytics;
mod api;
mod config;
mod data;
mod error;
mod events;
mod ingest;
mod services;

use std::sync::Arc;
use tracing::info;

use api::{run_server, AppState};
use config::AppConfig;
use data::store::Database;
use ingest::Ingestor;
use services::alert_engine::AlertEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    dotenvy::dotenv().ok();

    info!("Starting QuantStream...");

    // Load Configuration
    let config = AppConfig::load();
    info!(
        "Loaded configuration: {} symbols, db at {}",
        config.symbols.len(),
        config.database_path
    );

    // Initialize Database
    let db = Database::open(&config.database_path)?;
    db.init_schema()?;
    info!("Database ready at {}", config.database_path);

    // Start the ingestion pipeline. It runs until shutdown and its
    // failures never reach the request-serving path.
    let ingestor = Ingestor::new(db.clone(), &config);
    tokio::spawn(ingestor.run());

    // Start API Server
    let state = Arc::new(AppState {
        alerts: AlertEngine::new(db.clone()),
        db,
        config,
    });
    run_server(state).await;

    Ok(())
}
