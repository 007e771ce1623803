use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::{BenchmarkIndices, BenchmarkReport, CompareRequest, Holding, HoldingsBenchmarkComparison};
use crate::services::benchmark_service::{self, FallbackChain};
use crate::services::{bucket_service, portfolio_returns_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/compare", post(compare))
        .route("/indices", get(indices))
        .route("/holdings", post(holdings))
        .route("/cache", get(cache_stats).delete(clear_cache))
}

#[derive(Debug, Deserialize)]
pub struct HoldingsRequest {
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entries: usize,
}

/// POST /api/benchmark/compare
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<BenchmarkReport>, AppError> {
    info!(
        "POST /api/benchmark/compare - {} funds, duration={}",
        request.basket.len(),
        request.duration
    );

    if request.basket.is_empty() {
        return Err(AppError::Validation("basket must not be empty".to_string()));
    }
    bucket_service::validate_duration(request.duration)?;
    if !request.initial_investment.is_finite() || request.initial_investment <= 0.0 {
        return Err(AppError::Validation("initialInvestment must be greater than 0".to_string()));
    }

    let chain = FallbackChain::standard(state.nav.clone(), Utc::now().date_naive());
    let report = benchmark_service::compare_basket_with_benchmark(
        &request.basket,
        request.duration,
        request.initial_investment,
        state.index_returns.as_ref(),
        &chain,
    )
    .await?;

    Ok(Json(report))
}

/// GET /api/benchmark/indices
pub async fn indices() -> Json<BenchmarkIndices> {
    info!("GET /api/benchmark/indices - Listing category benchmarks");
    Json(benchmark_service::list_benchmark_indices())
}

/// POST /api/benchmark/holdings
pub async fn holdings(
    State(state): State<AppState>,
    Json(request): Json<HoldingsRequest>,
) -> Result<Json<HoldingsBenchmarkComparison>, AppError> {
    info!("POST /api/benchmark/holdings - {} holdings", request.holdings.len());

    if request.holdings.is_empty() {
        return Err(AppError::Validation("holdings must not be empty".to_string()));
    }

    let comparison = portfolio_returns_service::compare_holdings_with_benchmark(
        state.nav.as_ref(),
        state.index_returns.as_ref(),
        &request.holdings,
    )
    .await?;

    Ok(Json(comparison))
}

/// GET /api/benchmark/cache
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    state.benchmark_cache.cleanup_expired();
    let entries = state.benchmark_cache.len();
    info!("GET /api/benchmark/cache - {} live entries", entries);
    Json(CacheStats { entries })
}

/// DELETE /api/benchmark/cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheStats> {
    let cleared = state.benchmark_cache.len();
    state.benchmark_cache.clear();
    info!("DELETE /api/benchmark/cache - cleared {} entries", cleared);
    Json(CacheStats { entries: 0 })
}

