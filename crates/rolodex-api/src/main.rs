//! Rolodex API Server
//!
//! REST API server for the rolodex contact manager.

use rolodex_api::auth::{InMemoryDirectory, KvRevocationStore, MemoryKvStore};
use rolodex_api::{create_router, state::AppState};
use rolodex_core::AppConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolodex_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load and validate configuration; an invalid production
    // configuration must stop the process here, before it serves traffic
    let config = AppConfig::from_env()?.validate()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Single-instance defaults; multi-replica deployments swap in a
    // networked KeyValueStore and their own account directory
    let revocation = Arc::new(KvRevocationStore::new(MemoryKvStore::new()));
    let accounts = Arc::new(InMemoryDirectory::new());

    let state = Arc::new(AppState::new(config, revocation, accounts));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("rolodex API server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
