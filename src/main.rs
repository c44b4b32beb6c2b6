mod config;

use anyhow::Result;
use config::AppConfig;
use marketfeed_api::{create_routes, AppState};
use marketfeed_models::OddsChangeEvent;
use marketfeed_registry::MarketRegistry;
use marketfeed_stream::EventBus;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketfeed_rs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Marketfeed betting market registry");

    // Load configuration
    let config = AppConfig::new()?;
    info!("✅ Configuration loaded successfully");
    info!("🌐 Server will bind to: {}", config.server_addr());

    // Wire the bus into the registry, then share both with the API layer.
    let bus: EventBus<OddsChangeEvent> = EventBus::new(config.stream.subscriber_buffer);
    let registry = Arc::new(MarketRegistry::new(bus.clone()));

    let state = AppState { registry, bus };
    let app = create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    info!("✅ Listening on {}", listener.local_addr()?);
    info!("📡 Live odds stream available at /markets/stream");
    info!("⌨️  Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
