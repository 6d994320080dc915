//! ecotrack-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ecotrack_gateway::api;
use ecotrack_gateway::app_state::AppState;
use ecotrack_gateway::config::GatewayConfig;
use ecotrack_gateway::domain::EventBus;
use ecotrack_gateway::identity;
use ecotrack_gateway::persistence::{PostgresStore, Store};
use ecotrack_gateway::service::{CollectionService, RewardLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting ecotrack-gateway");

    // Connect to PostgreSQL and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Build persistence and domain layers
    let store: Arc<dyn Store> = Arc::new(PostgresStore::new(pool));
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let ledger = Arc::new(RewardLedger::new(Arc::clone(&store), event_bus.clone()));
    let collection = Arc::new(CollectionService::new(
        Arc::clone(&store),
        Arc::clone(&ledger),
        event_bus.clone(),
        config.report_reward_points,
        config.collect_reward_points,
    ));

    // Identity provider selected by deployment configuration
    let identity = identity::provider_for(config.auth_provider, Arc::clone(&store));

    // Build application state
    let app_state = AppState {
        ledger,
        collection,
        identity,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
