use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use fund_buckets::app::create_app;
use fund_buckets::config::AppConfig;
use fund_buckets::db::PgStore;
use fund_buckets::external::{
    CachedIndexReturns, IndexReturnChain, IndexReturnSource, NavIndexReturns, StaticIndexReturns,
};
use fund_buckets::logging::{init_logging, LoggingConfig};
use fund_buckets::models::IndexReturns;
use fund_buckets::services::returns_cache::TtlCache;
use fund_buckets::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = AppConfig::from_env();
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(pool));

    // Realized index NAVs first, the static table fills any gaps
    let benchmark_cache: TtlCache<IndexReturns> = TtlCache::new();
    let sources: Vec<Arc<dyn IndexReturnSource>> = vec![
        Arc::new(NavIndexReturns::new(store.clone())),
        Arc::new(StaticIndexReturns),
    ];
    let chain: Arc<dyn IndexReturnSource> = Arc::new(IndexReturnChain::new(sources));
    let index_returns = Arc::new(CachedIndexReturns::new(
        chain,
        Arc::new(benchmark_cache.clone()),
        chrono::Duration::hours(config.engine.benchmark_cache_ttl_hours),
    ));

    let state = AppState {
        store: store.clone(),
        nav: store,
        index_returns,
        benchmark_cache,
        config: config.engine.clone(),
    };
    let app = create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Fund bucket engine running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
