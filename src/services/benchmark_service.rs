use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::external::{IndexReturnSource, NavSource, StoreError};
use crate::models::{
    BasketHolding, BenchmarkComparison, BenchmarkComponent, BenchmarkIndexEntry, BenchmarkIndices,
    BenchmarkReport, BlendedBenchmark, ChartPoint, ComparisonSource, FundCategory, IndexReturns,
    OutperformanceSummary, Period,
};
use crate::services::historical_returns_service::portfolio_historical_returns;

/// Broad-market index for anything without a dedicated benchmark.
pub const DEFAULT_BENCHMARK_INDEX: &str = "NIFTY 500 TRI";
pub const BLENDED_BENCHMARK_NAME: &str = "Blended Index";

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("no period has both a basket and a benchmark return")]
    NoUsablePeriods,

    #[error("basket has no weight to compare")]
    EmptyBasket,

    #[error("index returns unavailable: {0}")]
    Source(#[from] StoreError),
}

/// Market index a fund category is measured against.
pub fn benchmark_for_category(category: FundCategory) -> &'static str {
    match category {
        FundCategory::LargeCap | FundCategory::Index => "NIFTY 50 TRI",
        FundCategory::MidCap => "NIFTY Midcap 150 TRI",
        FundCategory::SmallCap => "NIFTY Smallcap 250 TRI",
        FundCategory::FlexiCap | FundCategory::Elss => "NIFTY 500 TRI",
        FundCategory::Balanced => "CRISIL Hybrid 35+ TRI",
        FundCategory::Debt => "NIFTY 10yr G-Sec Index",
        FundCategory::Liquid => "NIFTY Liquid Index",
        FundCategory::Other => DEFAULT_BENCHMARK_INDEX,
    }
}

/// The category to index table, plus the distinct index names in table order.
pub fn list_benchmark_indices() -> BenchmarkIndices {
    let indices: Vec<BenchmarkIndexEntry> = FundCategory::ALL
        .iter()
        .map(|category| BenchmarkIndexEntry {
            category: *category,
            benchmark_index: benchmark_for_category(*category).to_string(),
        })
        .collect();

    let mut unique_indices: Vec<String> = Vec::new();
    for entry in &indices {
        if !unique_indices.contains(&entry.benchmark_index) {
            unique_indices.push(entry.benchmark_index.clone());
        }
    }

    BenchmarkIndices {
        indices,
        unique_indices,
    }
}

/// Category weights of a basket normalized to sum to 1, in order of first
/// appearance.
fn category_weights(basket: &[BasketHolding]) -> Result<Vec<(FundCategory, f64)>, BenchmarkError> {
    let mut weights: Vec<(FundCategory, f64)> = Vec::new();
    for holding in basket {
        let weight = holding.percentage / 100.0;
        match weights.iter_mut().find(|(c, _)| *c == holding.category) {
            Some((_, w)) => *w += weight,
            None => weights.push((holding.category, weight)),
        }
    }

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(BenchmarkError::EmptyBasket);
    }
    for (_, w) in weights.iter_mut() {
        *w /= total;
    }
    Ok(weights)
}

/// Weighted blend of the category indices of a basket.
///
/// A period appears in the blend only when every component index has a
/// return for it, so a partial blend never understates the benchmark.
pub async fn blended_benchmark(
    basket: &[BasketHolding],
    source: &dyn IndexReturnSource,
) -> Result<BlendedBenchmark, BenchmarkError> {
    let weights = category_weights(basket)?;

    let fetched = join_all(
        weights
            .iter()
            .map(|(category, _)| source.index_returns(benchmark_for_category(*category))),
    )
    .await;

    let mut components = Vec::with_capacity(weights.len());
    let mut component_returns: Vec<(f64, IndexReturns)> = Vec::with_capacity(weights.len());
    for ((category, weight), returns) in weights.iter().zip(fetched) {
        let index = benchmark_for_category(*category);
        let returns = returns?.unwrap_or_else(|| {
            warn!("No returns known for index {}", index);
            IndexReturns::new()
        });

        components.push(BenchmarkComponent {
            category: *category,
            benchmark_index: index.to_string(),
            weight: weight * 100.0,
        });
        component_returns.push((*weight, returns));
    }

    let mut benchmark_return = IndexReturns::new();
    for period in Period::ALL {
        let blended: Option<f64> = component_returns
            .iter()
            .map(|(weight, returns)| returns.get(&period).map(|r| r * weight))
            .sum();
        if let Some(value) = blended {
            benchmark_return.insert(period, value);
        }
    }

    Ok(BlendedBenchmark {
        benchmark_name: BLENDED_BENCHMARK_NAME.to_string(),
        benchmark_components: components,
        benchmark_return,
    })
}

/// Expected annual return of a basket, the same figure for every period.
pub fn expected_basket_returns(
    basket: &[BasketHolding],
) -> Result<BTreeMap<Period, Option<f64>>, BenchmarkError> {
    let total_weight: f64 = basket.iter().map(|h| h.percentage / 100.0).sum();
    if total_weight <= 0.0 {
        return Err(BenchmarkError::EmptyBasket);
    }

    let weighted: f64 = basket
        .iter()
        .map(|h| h.expected_return * h.percentage / 100.0)
        .sum();
    let value = weighted / total_weight;

    Ok(Period::ALL.iter().map(|p| (*p, Some(value))).collect())
}

/// Line up basket and benchmark returns period by period.
///
/// A difference (and a verdict) exists only where both sides have a value.
pub fn compare(
    basket_return: &BTreeMap<Period, Option<f64>>,
    benchmark: &BlendedBenchmark,
    source: ComparisonSource,
) -> BenchmarkComparison {
    let mut basket = BTreeMap::new();
    let mut bench = BTreeMap::new();
    let mut difference = BTreeMap::new();
    let mut beats_benchmark = BTreeMap::new();

    for period in Period::ALL {
        let b = basket_return.get(&period).copied().flatten();
        let m = benchmark.benchmark_return.get(&period).copied();

        let diff = match (b, m) {
            (Some(b), Some(m)) => Some(b - m),
            _ => None,
        };
        if let Some(d) = diff {
            beats_benchmark.insert(period, d > 0.0);
        }

        basket.insert(period, b);
        bench.insert(period, m);
        difference.insert(period, diff);
    }

    BenchmarkComparison {
        basket_return: basket,
        benchmark_return: bench,
        difference,
        beats_benchmark,
        benchmark_name: benchmark.benchmark_name.clone(),
        benchmark_components: benchmark.benchmark_components.clone(),
        source,
    }
}

/// Growth of `initial_investment` for basket and benchmark, one point per
/// period that fits in `duration` and has both returns.
pub fn chart_data(comparison: &BenchmarkComparison, duration: u32, initial_investment: f64) -> Vec<ChartPoint> {
    Period::ALL
        .iter()
        .filter_map(|period| {
            let years = period.years(duration);
            if years > duration {
                return None;
            }
            let basket = comparison.basket_return.get(period).copied().flatten()?;
            let benchmark = comparison.benchmark_return.get(period).copied().flatten()?;

            Some(ChartPoint {
                period: *period,
                years,
                basket_value: initial_investment * (1.0 + basket).powf(years as f64),
                benchmark_value: initial_investment * (1.0 + benchmark).powf(years as f64),
                basket_return: basket * 100.0,
                benchmark_return: benchmark * 100.0,
            })
        })
        .collect()
}

pub fn outperformance_summary(comparison: &BenchmarkComparison) -> OutperformanceSummary {
    OutperformanceSummary {
        outperformed_periods: comparison.beats_benchmark.values().filter(|b| **b).count(),
        total_periods: comparison.beats_benchmark.len(),
    }
}

// ---------------------------------------------------------------------------
// Comparison strategies
// ---------------------------------------------------------------------------

/// One way of producing a basket-vs-benchmark comparison.
///
/// Returning an error hands over to the next strategy in the chain.
#[async_trait]
pub trait ComparisonStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn compare(
        &self,
        basket: &[BasketHolding],
        benchmark: &BlendedBenchmark,
    ) -> Result<BenchmarkComparison, BenchmarkError>;
}

/// Realized basket returns from the NAV history of its schemes.
pub struct HistoricalComparison {
    nav: Arc<dyn NavSource>,
    as_of: NaiveDate,
}

impl HistoricalComparison {
    pub fn new(nav: Arc<dyn NavSource>, as_of: NaiveDate) -> Self {
        Self { nav, as_of }
    }
}

#[async_trait]
impl ComparisonStrategy for HistoricalComparison {
    fn name(&self) -> &'static str {
        "historical"
    }

    async fn compare(
        &self,
        basket: &[BasketHolding],
        benchmark: &BlendedBenchmark,
    ) -> Result<BenchmarkComparison, BenchmarkError> {
        let basket_return = portfolio_historical_returns(self.nav.as_ref(), basket, self.as_of).await;
        let comparison = compare(&basket_return, benchmark, ComparisonSource::Historical);
        if !comparison.has_usable_periods() {
            return Err(BenchmarkError::NoUsablePeriods);
        }
        Ok(comparison)
    }
}

/// Basket returns taken from each fund's expected annual return.
pub struct ExpectedComparison;

#[async_trait]
impl ComparisonStrategy for ExpectedComparison {
    fn name(&self) -> &'static str {
        "expected"
    }

    async fn compare(
        &self,
        basket: &[BasketHolding],
        benchmark: &BlendedBenchmark,
    ) -> Result<BenchmarkComparison, BenchmarkError> {
        let basket_return = expected_basket_returns(basket)?;
        let comparison = compare(&basket_return, benchmark, ComparisonSource::Expected);
        if !comparison.has_usable_periods() {
            return Err(BenchmarkError::NoUsablePeriods);
        }
        Ok(comparison)
    }
}

/// Ordered strategies; the first one that succeeds wins.
pub struct FallbackChain {
    strategies: Vec<Box<dyn ComparisonStrategy>>,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Box<dyn ComparisonStrategy>>) -> Self {
        Self { strategies }
    }

    /// Historical NAV returns first, expected returns after.
    pub fn standard(nav: Arc<dyn NavSource>, as_of: NaiveDate) -> Self {
        Self::new(vec![
            Box::new(HistoricalComparison::new(nav, as_of)),
            Box::new(ExpectedComparison),
        ])
    }

    pub async fn run(
        &self,
        basket: &[BasketHolding],
        benchmark: &BlendedBenchmark,
    ) -> Result<BenchmarkComparison, BenchmarkError> {
        let mut last_error = BenchmarkError::NoUsablePeriods;
        for strategy in &self.strategies {
            match strategy.compare(basket, benchmark).await {
                Ok(comparison) => return Ok(comparison),
                Err(e) => {
                    warn!("{} benchmark comparison failed: {}. Trying next.", strategy.name(), e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Compare a basket with its blended benchmark and chart the result.
///
/// # Arguments
/// * `basket` - funds with category, percentage and expected return
/// * `duration` - holding period in years; bounds the chart
/// * `initial_investment` - starting value of the chart series
/// * `index_returns` - source of per-index returns
/// * `chain` - comparison strategies to try in order
pub async fn compare_basket_with_benchmark(
    basket: &[BasketHolding],
    duration: u32,
    initial_investment: f64,
    index_returns: &dyn IndexReturnSource,
    chain: &FallbackChain,
) -> Result<BenchmarkReport, BenchmarkError> {
    if basket.is_empty() {
        return Err(BenchmarkError::EmptyBasket);
    }

    let benchmark = blended_benchmark(basket, index_returns).await?;
    let comparison = chain.run(basket, &benchmark).await?;
    let chart_data = chart_data(&comparison, duration, initial_investment);
    let summary = outperformance_summary(&comparison);

    info!(
        "Benchmark comparison ({:?}) for {} funds: beats {} of {} periods",
        comparison.source,
        basket.len(),
        summary.outperformed_periods,
        summary.total_periods
    );

    Ok(BenchmarkReport {
        comparison,
        chart_data,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{InMemoryStore, StaticIndexReturns};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn holding(symbol: &str, category: FundCategory, percentage: f64, ret: f64) -> BasketHolding {
        BasketHolding {
            symbol: symbol.to_string(),
            name: None,
            category,
            percentage,
            expected_return: ret,
            scheme_code: None,
        }
    }

    struct PartialSource;

    #[async_trait]
    impl IndexReturnSource for PartialSource {
        async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError> {
            let mut returns = IndexReturns::from([(Period::OneYear, 0.10), (Period::ThreeYears, 0.08)]);
            if index_name == "NIFTY 50 TRI" {
                returns.remove(&Period::ThreeYears);
            }
            Ok(Some(returns))
        }
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(benchmark_for_category(FundCategory::LargeCap), "NIFTY 50 TRI");
        assert_eq!(benchmark_for_category(FundCategory::Elss), "NIFTY 500 TRI");
        assert_eq!(benchmark_for_category(FundCategory::Other), DEFAULT_BENCHMARK_INDEX);
    }

    #[test]
    fn test_index_listing_is_deduplicated() {
        let listing = list_benchmark_indices();
        assert_eq!(listing.indices.len(), FundCategory::ALL.len());
        assert_eq!(listing.unique_indices.len(), 7);
        assert_eq!(listing.unique_indices[0], "NIFTY 50 TRI");
    }

    #[tokio::test]
    async fn test_blend_normalizes_category_weights() {
        let basket = vec![
            holding("A", FundCategory::LargeCap, 30.0, 0.1),
            holding("B", FundCategory::LargeCap, 30.0, 0.1),
            holding("C", FundCategory::Debt, 20.0, 0.07),
        ];
        let blend = blended_benchmark(&basket, &StaticIndexReturns).await.unwrap();

        assert_eq!(blend.benchmark_name, "Blended Index");
        assert_eq!(blend.benchmark_components.len(), 2);
        assert!((blend.benchmark_components[0].weight - 75.0).abs() < 1e-9);

        let expected = 0.75 * 0.18 + 0.25 * 0.07;
        assert!((blend.benchmark_return[&Period::OneYear] - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_blend_drops_periods_missing_for_any_component() {
        let basket = vec![
            holding("A", FundCategory::LargeCap, 50.0, 0.1),
            holding("B", FundCategory::MidCap, 50.0, 0.1),
        ];
        let blend = blended_benchmark(&basket, &PartialSource).await.unwrap();

        assert!(blend.benchmark_return.contains_key(&Period::OneYear));
        assert!(!blend.benchmark_return.contains_key(&Period::ThreeYears));
    }

    #[tokio::test]
    async fn test_blend_rejects_weightless_basket() {
        let basket = vec![holding("A", FundCategory::LargeCap, 0.0, 0.1)];
        let err = blended_benchmark(&basket, &StaticIndexReturns).await.unwrap_err();
        assert!(matches!(err, BenchmarkError::EmptyBasket));
    }

    #[test]
    fn test_null_benchmark_never_beats() {
        let blend = BlendedBenchmark {
            benchmark_name: BLENDED_BENCHMARK_NAME.to_string(),
            benchmark_components: Vec::new(),
            benchmark_return: IndexReturns::from([(Period::OneYear, 0.05)]),
        };
        let basket = BTreeMap::from([
            (Period::OneYear, Some(0.10)),
            (Period::ThreeYears, Some(0.50)),
            (Period::FiveYears, None),
        ]);

        let cmp = compare(&basket, &blend, ComparisonSource::Historical);
        assert_eq!(cmp.beats_benchmark.get(&Period::OneYear), Some(&true));
        assert_eq!(cmp.beats_benchmark.get(&Period::ThreeYears), None);
        assert_eq!(cmp.difference[&Period::ThreeYears], None);
        assert_eq!(cmp.benchmark_return[&Period::ThreeYears], None);
        assert!((cmp.difference[&Period::OneYear].unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_expected_returns_are_weighted_average() {
        let basket = vec![
            holding("A", FundCategory::LargeCap, 30.0, 0.12),
            holding("B", FundCategory::Debt, 10.0, 0.06),
        ];
        let returns = expected_basket_returns(&basket).unwrap();
        let expected = (0.12 * 0.3 + 0.06 * 0.1) / 0.4;

        assert_eq!(returns.len(), 4);
        assert!((returns[&Period::SinceInception].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_chart_respects_duration_and_nulls() {
        let blend = BlendedBenchmark {
            benchmark_name: BLENDED_BENCHMARK_NAME.to_string(),
            benchmark_components: Vec::new(),
            benchmark_return: IndexReturns::from([
                (Period::OneYear, 0.10),
                (Period::ThreeYears, 0.10),
                (Period::FiveYears, 0.10),
                (Period::SinceInception, 0.10),
            ]),
        };
        let basket = BTreeMap::from([
            (Period::OneYear, Some(0.20)),
            (Period::ThreeYears, None),
            (Period::FiveYears, Some(0.20)),
            (Period::SinceInception, Some(0.20)),
        ]);
        let cmp = compare(&basket, &blend, ComparisonSource::Expected);

        let chart = chart_data(&cmp, 3, 1_000.0);
        let periods: Vec<Period> = chart.iter().map(|p| p.period).collect();
        assert_eq!(periods, vec![Period::OneYear, Period::SinceInception]);
        assert!((chart[0].basket_value - 1_200.0).abs() < 1e-9);
        assert!((chart[1].benchmark_value - 1_331.0).abs() < 1e-9);
        assert!((chart[0].basket_return - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_falls_back_to_expected_without_nav_history() {
        let nav: Arc<dyn NavSource> = Arc::new(InMemoryStore::new());
        let chain = FallbackChain::standard(nav, d(2025, 1, 1));
        let basket = vec![holding("A", FundCategory::LargeCap, 100.0, 0.20)];

        let report = compare_basket_with_benchmark(&basket, 3, 100_000.0, &StaticIndexReturns, &chain)
            .await
            .unwrap();

        assert_eq!(report.comparison.source, ComparisonSource::Expected);
        assert_eq!(report.summary.total_periods, 4);
        // 20% vs NIFTY 50 TRI: beats every period
        assert_eq!(report.summary.outperformed_periods, 4);
        assert_eq!(report.chart_data.len(), 2);
    }

    #[tokio::test]
    async fn test_uses_historical_when_nav_history_exists() {
        let store = InMemoryStore::new().with_nav_history(
            "100",
            "Alpha Large Cap",
            FundCategory::LargeCap,
            &[(d(2024, 1, 1), 100.0), (d(2025, 1, 1), 105.0)],
        );
        let chain = FallbackChain::standard(Arc::new(store), d(2025, 1, 1));
        let mut fund = holding("A", FundCategory::LargeCap, 100.0, 0.20);
        fund.scheme_code = Some("100".to_string());

        let report = compare_basket_with_benchmark(&[fund], 1, 100_000.0, &StaticIndexReturns, &chain)
            .await
            .unwrap();

        assert_eq!(report.comparison.source, ComparisonSource::Historical);
        assert_eq!(report.summary.total_periods, 1);
        assert!(!report.comparison.beats_benchmark[&Period::OneYear]);
    }

    #[tokio::test]
    async fn test_historical_five_year_is_an_annual_rate() {
        let as_of = d(2025, 1, 1);
        let store = InMemoryStore::new().with_nav_history(
            "100",
            "Steady Large Cap",
            FundCategory::LargeCap,
            &[(as_of - chrono::Duration::days(1825), 100.0), (as_of, 161.051)],
        );
        let chain = FallbackChain::standard(Arc::new(store), as_of);
        let mut fund = holding("A", FundCategory::LargeCap, 100.0, 0.20);
        fund.scheme_code = Some("100".to_string());

        let report = compare_basket_with_benchmark(&[fund], 5, 100_000.0, &StaticIndexReturns, &chain)
            .await
            .unwrap();

        // 10% a year against NIFTY 50 TRI's 14%
        let five = report.comparison.basket_return[&Period::FiveYears].unwrap();
        assert!((five - 0.10).abs() < 1e-9);
        assert!(!report.comparison.beats_benchmark[&Period::FiveYears]);

        let point = report
            .chart_data
            .iter()
            .find(|p| p.period == Period::FiveYears)
            .unwrap();
        assert!((point.basket_value - 161_051.0).abs() < 1e-3);
    }

    #[test]
    fn test_chart_compounds_long_durations() {
        let blend = BlendedBenchmark {
            benchmark_name: BLENDED_BENCHMARK_NAME.to_string(),
            benchmark_components: Vec::new(),
            benchmark_return: IndexReturns::from([(Period::SinceInception, 0.05)]),
        };
        let basket = BTreeMap::from([(Period::SinceInception, Some(0.05))]);
        let cmp = compare(&basket, &blend, ComparisonSource::Expected);

        let chart = chart_data(&cmp, 40, 1_000.0);
        assert_eq!(chart.len(), 1);
        assert!((chart[0].basket_value - 1_000.0 * 1.05f64.powi(40)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_basket_is_an_error() {
        let chain = FallbackChain::new(vec![Box::new(ExpectedComparison)]);
        let result = compare_basket_with_benchmark(&[], 3, 1.0, &StaticIndexReturns, &chain).await;
        assert!(matches!(result, Err(BenchmarkError::EmptyBasket)));
    }
}
