use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinescope::{
    api::{create_router, AppState},
    cache::{QueryCache, RetryPolicy},
    config::Config,
    services::{ActorDirectory, LibraryStore, MovieProvider, OmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinescope=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.omdb_api_key.is_none() {
        tracing::warn!("OMDB_API_KEY is not set; movie lookups will fail");
    }

    let cache = QueryCache::new(
        config.cache_ttl(),
        RetryPolicy::new(config.fetch_retries, config.retry_base_delay()),
    );
    let sweeper = cache.start_sweeper(config.cache_sweep_interval());

    let provider: Arc<dyn MovieProvider> = Arc::new(OmdbProvider::new(
        cache,
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
    ));

    let actors = match &config.actor_data_path {
        Some(path) => ActorDirectory::load(path)
            .await
            .with_context(|| format!("Failed to load actor dataset from {}", path))?,
        None => ActorDirectory::default(),
    };

    let library = LibraryStore::open(&config.library_path)
        .await
        .with_context(|| format!("Failed to open library {}", config.library_path))?;

    let state = AppState::new(provider, Arc::new(actors), library, config.genre_batch_size);
    let reaper = state
        .discovery
        .start_reaper(config.cache_sweep_interval(), config.session_idle());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.shutdown().await;
    sweeper.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
