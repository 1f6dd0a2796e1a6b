mod config;
mod error;
mod handlers;
mod models;
mod records;
mod render;
mod storage;
mod validate;

use crate::config::Config;
use crate::models::AppState;
use crate::records::CertificateStore;
use crate::render::{DocumentCache, RenderPool, SidecarEngine};
use crate::storage::ArtifactStore;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let store = match ArtifactStore::new(
        &config.storage_dir,
        config.durable_storage,
        config.artifact_ttl,
    ) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to prepare artifact storage: {}", e);
            std::process::exit(1);
        }
    };
    let records = CertificateStore::load(&config.records_file);
    let engine = Arc::new(SidecarEngine::new(&config.renderer_url));
    let cache = DocumentCache::new(config.cache_capacity);
    let pool = RenderPool::new(config.render_workers, config.render_timeout);

    info!(
        "Artifact storage: {} ({})",
        config.storage_dir.display(),
        if config.durable_storage {
            "durable"
        } else {
            "ephemeral"
        }
    );
    info!("Renderer sidecar: {}", config.renderer_url);
    info!(
        "Render pool: {} workers, {}s timeout",
        config.render_workers,
        config.render_timeout.as_secs()
    );

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        engine,
        cache,
        pool,
        store,
        records,
    });
    let app = handlers::router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
