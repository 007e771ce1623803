use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::errors::AppError;
use crate::external::{FundStore, IndexReturnSource, NavSource};
use crate::models::{
    BasketHolding, BucketOption, FundType, GenerateBucketsRequest, GenerateBucketsResponse,
    RiskLevel, ScoredFund,
};
use crate::services::allocation_service::{build_bucket, strategy};
use crate::services::benchmark_service::{compare_basket_with_benchmark, FallbackChain};
use crate::services::scoring_service::{build_candidates, resolve_market_series, score_funds};

pub const RECOMMENDED_LABEL: &str = "Recommended";

/// Longest horizon, in years, a projection is computed for.
pub const MAX_DURATION_YEARS: u32 = 100;

// Alternates follow the recommended option in this order.
const ALTERNATES: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::High, RiskLevel::Medium];

/// Validate a bucket request before any data is read.
pub fn validate_request(request: &GenerateBucketsRequest) -> Result<(), AppError> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(AppError::Validation("amount must be greater than 0".to_string()));
    }
    validate_duration(request.duration)
}

pub fn validate_duration(duration: u32) -> Result<(), AppError> {
    if duration < 1 {
        return Err(AppError::Validation("duration must be at least 1 year".to_string()));
    }
    if duration > MAX_DURATION_YEARS {
        return Err(AppError::Validation(format!(
            "duration must be at most {} years",
            MAX_DURATION_YEARS
        )));
    }
    Ok(())
}

/// Load the mutual fund universe and score every fund that has enough history.
///
/// Fails with `NoFundsAvailable` when the universe is empty or no fund
/// survives candidate construction.
pub async fn score_universe(store: &dyn FundStore, config: &EngineConfig) -> Result<Vec<ScoredFund>, AppError> {
    let records = store.list_funds(FundType::MutualFund).await?;
    if records.is_empty() {
        warn!("Fund universe is empty");
        return Err(AppError::NoFundsAvailable);
    }

    let store_market = match store.market_history().await {
        Ok(market) => market,
        Err(e) => {
            warn!("Market history unavailable: {}. Beta and alpha fall back to neutral values.", e);
            None
        }
    };
    let market = resolve_market_series(store_market, &records, config.market_proxy_symbol.as_deref());

    // Phase 1 computes every fund's metrics; phase 2 normalizes over all of them
    let candidates = build_candidates(&records, market.as_deref(), config);
    if candidates.is_empty() {
        warn!("None of {} funds has enough price history to score", records.len());
        return Err(AppError::NoFundsAvailable);
    }

    Ok(score_funds(candidates))
}

/// Generate the recommended bucket and its alternates, each annotated with
/// a benchmark comparison when one can be produced.
///
/// # Arguments
/// * `store` - fund universe
/// * `nav` - NAV history for the historical benchmark comparison
/// * `index_returns` - per-index returns for the blended benchmark
/// * `config` - engine settings
/// * `request` - amount, duration and risk level
/// * `as_of` - date historical return windows end at
pub async fn generate_buckets(
    store: &dyn FundStore,
    nav: Arc<dyn NavSource>,
    index_returns: &dyn IndexReturnSource,
    config: &EngineConfig,
    request: GenerateBucketsRequest,
    as_of: NaiveDate,
) -> Result<GenerateBucketsResponse, AppError> {
    validate_request(&request)?;
    info!(
        "Generating buckets: amount={}, duration={}, risk_level={}",
        request.amount, request.duration, request.risk_level
    );

    let scored = score_universe(store, config).await?;

    let plan = std::iter::once((request.risk_level, RECOMMENDED_LABEL, true)).chain(
        ALTERNATES
            .iter()
            .map(|level| (*level, level.alternative_label(), false)),
    );
    let mut options: Vec<BucketOption> = plan
        .map(|(level, label, is_recommended)| {
            let bucket = build_bucket(
                &scored,
                &strategy(level),
                request.amount,
                request.duration,
                config.funds_per_category,
            );
            BucketOption::from_bucket(bucket, label, is_recommended)
        })
        .collect();

    let chain = FallbackChain::standard(nav, as_of);
    let reports = join_all(options.iter().map(|option| {
        let basket: Vec<BasketHolding> = option.bucket.iter().map(BasketHolding::from).collect();
        let chain = &chain;
        async move {
            compare_basket_with_benchmark(
                &basket,
                request.duration,
                request.amount,
                index_returns,
                chain,
            )
            .await
        }
    }))
    .await;

    for (option, report) in options.iter_mut().zip(reports) {
        match report {
            Ok(report) => {
                option.benchmark_comparison = Some(report.comparison);
                option.chart_data = Some(report.chart_data);
            }
            Err(e) => warn!(
                "No benchmark for {} option: {}",
                option.strategy.risk_level, e
            ),
        }
    }

    info!("Generated {} bucket options", options.len());
    Ok(GenerateBucketsResponse {
        generated_at: Utc::now(),
        input: request,
        total_options: options.len(),
        bucket_options: options,
    })
}
