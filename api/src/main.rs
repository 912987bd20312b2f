// ./api/src/main.rs
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Application layer: catalog and stats services plus the store port
use application::{BookStore, CatalogService, StatsService};
// Infrastructure layer implementations
use infrastructure::{InMemoryBookStore, JsonFileBookStore};

mod config;
mod routes;

use config::{Config, StorageKind};
use routes::{AppState, router};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = Config::from_env();

    // --- Dependency Injection ---
    // 1. Create the persistence gateway
    let store: Arc<dyn BookStore> = match config.storage {
        StorageKind::File => Arc::new(JsonFileBookStore::new(&config.data_file)),
        StorageKind::Memory => Arc::new(InMemoryBookStore::new()),
    };
    info!(store = %store.location(), "Persistence gateway initialized.");

    // 2. Load the catalog; a store we cannot read is never overwritten
    let catalog = match CatalogService::load(store, config.search).await {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            error!("Refusing to start, catalog could not be loaded: {}", e);
            std::process::exit(1);
        }
    };
    let data_dir = config
        .data_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stats_service = Arc::new(StatsService::new(catalog.clone(), data_dir));
    info!("Application services initialized.");

    // 3. Create the application state and routes
    let app = router(AppState {
        catalog,
        stats_service,
    });
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
