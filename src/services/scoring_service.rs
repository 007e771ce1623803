use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::models::{
    FundCandidate, FundRecord, MetricSet, NormalizedMetrics, PricePoint, PriceSeries, ScoreBreakdown,
    ScoredFund,
};
use crate::services::returns::{aligned_returns, bounded_expected_return, cagr, compute_returns, mean};
use crate::services::risk_metrics::compute_metric_set;

// Sub-score weights. Each sub-score already carries its internal weights,
// and the final score re-weights by category total.
const SHARPE_WEIGHT: f64 = 0.20;
const SORTINO_WEIGHT: f64 = 0.15;
const TREYNOR_WEIGHT: f64 = 0.10;
const SD_WEIGHT: f64 = 0.15;
const BETA_WEIGHT: f64 = 0.10;
const ALPHA_WEIGHT: f64 = 0.12;
const INFO_RATIO_WEIGHT: f64 = 0.08;
const EXPENSE_WEIGHT: f64 = 0.06;
const TURNOVER_WEIGHT: f64 = 0.04;

const RISK_ADJUSTED_TOTAL: f64 = 0.45;
const STABILITY_TOTAL: f64 = 0.25;
const MANAGER_SKILL_TOTAL: f64 = 0.20;
const COST_EFFICIENCY_TOTAL: f64 = 0.10;

/// Minimum number of returns a fund needs to be scored at all.
const MIN_RETURNS: usize = 2;

/// Min-max normalize into [0, 1]; a zero-width range maps to 0.5.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min.is_finite() && max.is_finite() {
            Self { min, max }
        } else {
            Self { min: 0.0, max: 0.0 }
        }
    }

    fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

/// Normalization bounds of one scoring population.
#[derive(Debug, Clone, Copy)]
pub struct PopulationBounds {
    sharpe: Range,
    sortino: Range,
    treynor: Range,
    alpha: Range,
    info_ratio: Range,
    sd: Range,
    beta_deviation: Range,
    expense: Range,
    turnover: Range,
}

impl PopulationBounds {
    pub fn from_population(population: &[MetricSet]) -> Self {
        let range = |f: fn(&MetricSet) -> f64| Range::of(population.iter().map(f));
        let max_beta_deviation = population
            .iter()
            .map(|m| (m.beta - 1.0).abs())
            .fold(0.0, f64::max);

        Self {
            sharpe: range(|m| m.sharpe_ratio),
            sortino: range(|m| m.sortino_ratio),
            treynor: range(|m| m.treynor_ratio),
            alpha: range(|m| m.alpha),
            info_ratio: range(|m| m.information_ratio),
            sd: range(|m| m.standard_deviation),
            // |beta - 1| is measured from zero deviation, not from the population minimum
            beta_deviation: Range { min: 0.0, max: max_beta_deviation },
            expense: range(|m| m.expense_ratio),
            turnover: range(|m| m.turnover_ratio),
        }
    }

    /// Score one fund against these bounds.
    pub fn score(&self, metrics: &MetricSet) -> ScoreBreakdown {
        let normalized = NormalizedMetrics {
            sharpe: self.sharpe.normalize(metrics.sharpe_ratio),
            sortino: self.sortino.normalize(metrics.sortino_ratio),
            treynor: self.treynor.normalize(metrics.treynor_ratio),
            alpha: self.alpha.normalize(metrics.alpha),
            info_ratio: self.info_ratio.normalize(metrics.information_ratio),
            // lower is better
            sd: 1.0 - self.sd.normalize(metrics.standard_deviation),
            beta: 1.0 - self.beta_deviation.normalize((metrics.beta - 1.0).abs()),
            expense: 1.0 - self.expense.normalize(metrics.expense_ratio),
            turnover: 1.0 - self.turnover.normalize(metrics.turnover_ratio),
        };

        let risk_adjusted_score = normalized.sharpe * SHARPE_WEIGHT
            + normalized.sortino * SORTINO_WEIGHT
            + normalized.treynor * TREYNOR_WEIGHT;
        let stability_score = normalized.sd * SD_WEIGHT + normalized.beta * BETA_WEIGHT;
        let manager_skill_score =
            normalized.alpha * ALPHA_WEIGHT + normalized.info_ratio * INFO_RATIO_WEIGHT;
        let cost_efficiency_score =
            normalized.expense * EXPENSE_WEIGHT + normalized.turnover * TURNOVER_WEIGHT;

        let final_score = 100.0
            * (risk_adjusted_score * RISK_ADJUSTED_TOTAL
                + stability_score * STABILITY_TOTAL
                + manager_skill_score * MANAGER_SKILL_TOTAL
                + cost_efficiency_score * COST_EFFICIENCY_TOTAL);

        ScoreBreakdown {
            final_score,
            risk_adjusted_score,
            stability_score,
            manager_skill_score,
            cost_efficiency_score,
            normalized,
        }
    }
}

/// Composite score of one fund relative to a population of metric sets.
///
/// The score is only meaningful inside that population; bounds are
/// recomputed on every call.
pub fn calculate_fund_score(metrics: &MetricSet, population: &[MetricSet]) -> ScoreBreakdown {
    PopulationBounds::from_population(population).score(metrics)
}

/// Phase 1: turn raw fund records into candidates with their metric sets.
///
/// Funds without enough price history are excluded with a warning; missing
/// expense or turnover ratios are filled with the population mean so a gap
/// in the data neither rewards nor punishes a fund.
///
/// # Arguments
/// * `records` - the fund universe as returned by the store
/// * `market` - market series for beta, alpha and the information ratio
/// * `config` - risk-free rate and expected-return clamping
pub fn build_candidates(
    records: &[FundRecord],
    market: Option<&[PricePoint]>,
    config: &EngineConfig,
) -> Vec<FundCandidate> {
    let expense_fill = mean(&records.iter().filter_map(|r| r.expense_ratio).collect::<Vec<_>>());
    let turnover_fill = mean(&records.iter().filter_map(|r| r.turnover_ratio).collect::<Vec<_>>());

    let mut candidates = Vec::with_capacity(records.len());
    for record in records {
        let series = PriceSeries::from_points(record.price_history.iter().copied());
        let returns = match compute_returns(&series) {
            Some(r) if r.len() >= MIN_RETURNS => r,
            _ => {
                warn!(
                    "Excluding {} from scoring: {} usable prices",
                    record.symbol,
                    series.len()
                );
                continue;
            }
        };

        let aligned = market.map(|m| aligned_returns(&series, m));
        let aligned_pair = aligned
            .as_ref()
            .filter(|(fund, _)| fund.len() >= MIN_RETURNS)
            .map(|(fund, market)| (fund.as_slice(), market.as_slice()));
        if market.is_some() && aligned_pair.is_none() {
            debug!("No overlap with market series for {}", record.symbol);
        }

        let metrics = compute_metric_set(
            &returns,
            aligned_pair,
            config.risk_free_rate,
            record.expense_ratio.unwrap_or(expense_fill),
            record.turnover_ratio.unwrap_or(turnover_fill),
        );

        let mut derived_return = cagr(&series);
        if config.clamp_expected_returns {
            derived_return = bounded_expected_return(derived_return, record.category);
        }

        candidates.push(FundCandidate {
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            category: record.category,
            risk_category: record.risk_category,
            scheme_code: record.scheme_code.clone(),
            price_series: series,
            derived_return,
            metrics,
        });
    }

    info!(
        "Built {} scoring candidates from {} funds",
        candidates.len(),
        records.len()
    );
    candidates
}

/// Phase 2: normalize against the whole candidate set and score each fund.
///
/// Must run after every candidate's metrics exist; the normalization bounds
/// come from the full population.
pub fn score_funds(candidates: Vec<FundCandidate>) -> Vec<ScoredFund> {
    let population: Vec<MetricSet> = candidates.iter().map(|c| c.metrics).collect();
    let bounds = PopulationBounds::from_population(&population);

    candidates
        .into_iter()
        .map(|candidate| {
            let score_breakdown = bounds.score(&candidate.metrics);
            ScoredFund {
                metrics: candidate.metrics,
                candidate,
                score_breakdown,
            }
        })
        .collect()
}

/// Pick the market series: the store's own proxy if it has one, else the
/// price history of the configured proxy symbol from the universe.
pub fn resolve_market_series(
    store_market: Option<Vec<PricePoint>>,
    records: &[FundRecord],
    proxy_symbol: Option<&str>,
) -> Option<Vec<PricePoint>> {
    if let Some(market) = store_market.filter(|m| m.len() >= 2) {
        return Some(market);
    }
    let symbol = proxy_symbol?;
    let proxy = records
        .iter()
        .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
        .map(|r| r.price_history.clone());
    if proxy.is_none() {
        warn!("Market proxy {} not found in fund universe", symbol);
    }
    proxy
}
