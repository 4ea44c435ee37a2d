//! CarInsight Gateway - local development server
//!
//! Serves the CarInsight API through the serverless adapter, backed by the
//! in-memory document store.

use carinsight_gateway::app::CarInsightApp;
use carinsight_gateway::prelude::*;
use carinsight_gateway::services::MemoryStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting CarInsight gateway...");

    let config = GatewayConfig::from_env();

    let adapter = install(Adapter::new(
        config.clone(),
        AppCell::lazy(|| {
            let store = Arc::new(MemoryStore::new());
            Ok(Arc::new(CarInsightApp::new(store.clone(), store)) as Arc<dyn Application>)
        }),
    ));

    tracing::info!("Mount prefix: {}", config.mount_prefix);
    tracing::info!("Try: curl http://localhost:{}/api/health", config.port);
    tracing::info!(
        "Try: curl -X OPTIONS -H 'Origin: https://app.vercel.app' http://localhost:{}/api/users/",
        config.port
    );

    GatewayServer::new(config, adapter).run().await
}
