mod api;
mod cache;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use beanfeed_core::Vocabulary;
use beanfeed_scraper::{Aggregator, BatchScheduler, Extractor, ShopifyClient, ShopifySource};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    cache::{AggregatorRefresher, CatalogService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(beanfeed_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sources = beanfeed_core::load_sources(&config.sources_path)?.sources;
    let vocabulary = match &config.vocabulary_path {
        Some(path) => beanfeed_core::load_vocabulary(path)?,
        None => Vocabulary::default(),
    };

    let source = ShopifySource::new(
        ShopifyClient::from_app_config(&config)?,
        Extractor::new(vocabulary),
    );
    let aggregator = Aggregator::new(source, BatchScheduler::from_app_config(&config));
    let source_count = sources.len();

    let shutdown = CancellationToken::new();
    let catalog = Arc::new(CatalogService::new(
        Arc::new(AggregatorRefresher::new(aggregator, sources)),
        Duration::from_secs(config.cache_ttl_secs),
        Duration::from_secs(config.refresh_timeout_secs),
        shutdown.clone(),
    ));

    scheduler::spawn_warmup(Arc::clone(&catalog));
    let _scheduler = scheduler::build_scheduler(Arc::clone(&catalog), &config.refresh_cron).await?;

    let app = build_app(AppState { catalog }, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        sources = source_count,
        "beanfeed server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    shutdown.cancel();
}
