//! Main Entrypoint for the CxSE Training API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the scenario catalog and opening the session store.
//! 3. Building the training session manager with its runtime capabilities.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use cxse_api::{config::Config, router::create_router, state::AppState};
use cxse_core::{
    TrainingSessionManager,
    capabilities::{RandomDelay, TracingAnnouncer},
    catalog::ScenarioCatalog,
    random::seeded,
    store::{FileSessionStore, InMemorySessionStore, SessionStore},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn load_catalog(config: &Config) -> anyhow::Result<ScenarioCatalog> {
    let catalog = match &config.scenarios_path {
        Some(path) => ScenarioCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load scenarios from {}", path.display()))?,
        None => ScenarioCatalog::builtin(&config.default_role)
            .context("Failed to build the built-in scenario catalog")?,
    };
    Ok(catalog)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match &config.session_store_path {
        Some(path) => {
            let store = FileSessionStore::open(path)
                .await
                .with_context(|| format!("Failed to open session store {}", path.display()))?;
            info!(path = %store.path().display(), "Recording sessions to file.");
            Arc::new(store)
        }
        None => Arc::new(InMemorySessionStore::new()),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Catalog and Store ---
    let catalog = load_catalog(&config)?;
    info!(
        scenarios = catalog.len(),
        default_role = %catalog.default_role(),
        "Scenario catalog loaded."
    );
    let store = open_store(&config).await?;

    // --- 4. Session Manager ---
    let mut manager = TrainingSessionManager::new(catalog, store)
        .with_delay(Arc::new(RandomDelay::new(
            config.response_delay_min,
            config.response_delay_max,
        )))
        .with_announcer(Arc::new(TracingAnnouncer));
    if let Some(seed) = config.rng_seed {
        info!(seed, "Using seeded random source.");
        manager = manager.with_random_source(seeded(seed));
    }

    let app_state = Arc::new(AppState {
        manager: Arc::new(manager),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
