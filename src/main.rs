use std::sync::Arc;

use color_eyre::eyre::{eyre, Result};
use dotenv::dotenv;
use slotbook_api::config::{ApiConfig, StoreBackend};
use slotbook_api::ApiState;
use slotbook_core::service::AvailabilityService;
use slotbook_core::store::{ChangeFeed, MarketStore};
use slotbook_db::{create_pool, schema::initialize_database, InMemoryStore, PgStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    slotbook_api::init_tracing(config.log_level)?;

    let feed = ChangeFeed::new(config.change_feed_capacity);
    let store: Arc<dyn MarketStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| eyre!("DATABASE_URL is required for the postgres backend"))?;

            // Create database connection pool
            let db_pool = create_pool(database_url).await?;

            // Initialize database schema
            initialize_database(&db_pool).await?;

            let store = PgStore::new(db_pool, feed);
            store.spawn_listener();
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; nothing survives a restart");
            Arc::new(InMemoryStore::new(feed))
        }
    };
    info!(
        "Store backend: {} (store timeout {:?})",
        config.store_backend, config.store_timeout
    );

    let service = AvailabilityService::new(store, config.store_timeout);

    // Start API server
    slotbook_api::start_server(config, Arc::new(ApiState { service })).await?;

    Ok(())
}
