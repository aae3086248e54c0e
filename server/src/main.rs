//! Rolodex Server - contact sync between a local store and a remote directory.
//!
//! This server exposes the local contact store and the sync operations over
//! HTTP, using the rolodex-engine reconciliation logic.

mod config;
mod db;
mod directory;
mod error;
mod handlers;
mod routes;
mod store;
mod sync;

use crate::config::Config;
use crate::directory::{HttpDirectory, RemoteDirectory};
use crate::store::{ContactStore, MemoryContactStore, PgContactStore};
use crate::sync::{SyncOrchestrator, SyncSettings};
use axum::Router;
use rolodex_engine::{Reconciler, Timestamp};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub directory: Arc<dyn RemoteDirectory>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub config: Arc<Config>,
}

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolodex_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Rolodex Server on {}:{}", config.host, config.port);

    let store: Arc<dyn ContactStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;

            Arc::new(PgContactStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, contacts are kept in memory");
            Arc::new(MemoryContactStore::new())
        }
    };

    let directory: Arc<dyn RemoteDirectory> = Arc::new(HttpDirectory::new(&config.directory)?);
    tracing::info!(
        url = %config.directory.base_url,
        page_size = config.directory.page_size,
        "Remote directory configured"
    );

    let orchestrator = Arc::new(SyncOrchestrator::new(
        store.clone(),
        directory.clone(),
        Reconciler::new().compare(config.compare_fields),
        SyncSettings {
            export_concurrency: config.export_concurrency,
            push_local_winners: config.push_local_winners,
        },
    ));

    // Build application state
    let state = AppState {
        store,
        directory,
        orchestrator,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
