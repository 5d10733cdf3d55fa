use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use creatorlink::config::Config;
use creatorlink::storage::{self, CachedStorage, Storage};
use creatorlink::{api, redirect};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("creatorlink=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let backing = storage::open(&config.database).await?;
    info!("Database initialized successfully");

    let cached = Arc::new(CachedStorage::new(
        backing,
        config.cache.max_entries,
        config.cache.ttl_secs,
        config.cache.click_flush_interval_secs,
    ));
    let storage: Arc<dyn Storage> = cached.clone();
    info!(
        max_entries = config.cache.max_entries,
        ttl_secs = config.cache.ttl_secs,
        flush_interval_secs = config.cache.click_flush_interval_secs,
        "Slug cache and click buffer enabled"
    );

    if config.test_token.is_some() {
        info!("Load-test data routes mounted under /api/test");
    }

    let api_router = api::create_api_router(Arc::clone(&storage), &config);
    let redirect_router = redirect::create_redirect_router(Arc::clone(&storage));

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);

    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("Redirect server listening on http://{}", redirect_addr);

    tokio::try_join!(
        axum::serve(api_listener, api_router).with_graceful_shutdown(shutdown_signal()),
        axum::serve(
            redirect_listener,
            redirect_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal()),
    )?;

    cached.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
