use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bucket::FundAllocation;
use super::fund::FundCategory;

/// Holding period of a benchmark comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    /// Since inception; projected over the requested duration
    #[serde(rename = "SI")]
    SinceInception,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::OneYear,
        Period::ThreeYears,
        Period::FiveYears,
        Period::SinceInception,
    ];

    /// Periods that can be measured from NAV history.
    pub const HISTORICAL: [Period; 3] = [Period::OneYear, Period::ThreeYears, Period::FiveYears];

    /// Look-back window in days, `None` for since-inception.
    pub fn days(&self) -> Option<i64> {
        match self {
            Period::OneYear => Some(365),
            Period::ThreeYears => Some(1095),
            Period::FiveYears => Some(1825),
            Period::SinceInception => None,
        }
    }

    pub fn years(&self, duration: u32) -> u32 {
        match self {
            Period::OneYear => 1,
            Period::ThreeYears => 3,
            Period::FiveYears => 5,
            Period::SinceInception => duration,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::OneYear => "1Y",
            Period::ThreeYears => "3Y",
            Period::FiveYears => "5Y",
            Period::SinceInception => "SI",
        }
    }
}

/// Annual index returns keyed by period. Sources may cover a subset.
pub type IndexReturns = BTreeMap<Period, f64>;

/// Minimal view of a basket entry needed for benchmarking.
///
/// Clients can post this directly; bucket allocations convert into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketHolding {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub category: FundCategory,
    /// Share of the basket, in percent
    pub percentage: f64,
    #[serde(default, alias = "expectedReturn")]
    pub expected_return: f64,
    #[serde(default, alias = "schemeCode")]
    pub scheme_code: Option<String>,
}

impl From<&FundAllocation> for BasketHolding {
    fn from(a: &FundAllocation) -> Self {
        Self {
            symbol: a.symbol.clone(),
            name: Some(a.name.clone()),
            category: a.category,
            percentage: a.percentage,
            expected_return: a.expected_return,
            scheme_code: a.scheme_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComponent {
    pub category: FundCategory,
    pub benchmark_index: String,
    /// Normalized category weight, in percent
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedBenchmark {
    pub benchmark_name: String,
    pub benchmark_components: Vec<BenchmarkComponent>,
    /// Periods for which every component index had a return
    pub benchmark_return: IndexReturns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonSource {
    /// Basket returns realized from NAV history
    Historical,
    /// Basket returns taken from the funds' expected returns
    Expected,
}

/// Basket vs blended benchmark per period.
///
/// `None` marks a period without enough data. `beats_benchmark` only holds
/// periods where both sides are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub basket_return: BTreeMap<Period, Option<f64>>,
    pub benchmark_return: BTreeMap<Period, Option<f64>>,
    pub difference: BTreeMap<Period, Option<f64>>,
    pub beats_benchmark: BTreeMap<Period, bool>,
    pub benchmark_name: String,
    pub benchmark_components: Vec<BenchmarkComponent>,
    pub source: ComparisonSource,
}

impl BenchmarkComparison {
    pub fn has_usable_periods(&self) -> bool {
        !self.beats_benchmark.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub period: Period,
    pub years: u32,
    pub basket_value: f64,
    pub benchmark_value: f64,
    /// Percent
    pub basket_return: f64,
    /// Percent
    pub benchmark_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutperformanceSummary {
    pub outperformed_periods: usize,
    pub total_periods: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub comparison: BenchmarkComparison,
    pub chart_data: Vec<ChartPoint>,
    pub summary: OutperformanceSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub basket: Vec<BasketHolding>,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_initial_investment", alias = "initialInvestment")]
    pub initial_investment: f64,
}

fn default_duration() -> u32 {
    3
}

fn default_initial_investment() -> f64 {
    100_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkIndexEntry {
    pub category: FundCategory,
    pub benchmark_index: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkIndices {
    pub indices: Vec<BenchmarkIndexEntry>,
    pub unique_indices: Vec<String>,
}
