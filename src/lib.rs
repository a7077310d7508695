pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{ApiError, ApiResult};
pub use logic::{build_latest_location_query, build_list_query, QueryParams, RecordRepository};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryStore, PostgresStore, Store};

/// Serve the API on `listener` until the process is stopped.
pub async fn serve<S: Store + 'static>(
    store: std::sync::Arc<S>,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let app: axum::Router = crate::api::routes::create_router::<S>().with_state(store);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Function for integration testing and the binary: load config, pick a store, serve.
pub async fn run_server() -> anyhow::Result<()> {
    use crate::config::{AppConfig, StorageBackend};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    let config = AppConfig::load()?;
    let bind_address = config.server_address();

    match config.storage.backend {
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&config.database_url(), config.max_connections()).await?;
            store.migrate().await?;
            log::info!("Database schema ready");

            let listener = TcpListener::bind(&bind_address).await?;
            log::info!("GPS tracker API running on http://{}", bind_address);
            serve(Arc::new(store), listener).await
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; data is lost on shutdown");
            let listener = TcpListener::bind(&bind_address).await?;
            log::info!("GPS tracker API running on http://{}", bind_address);
            serve(Arc::new(InMemoryStore::new()), listener).await
        }
    }
}
