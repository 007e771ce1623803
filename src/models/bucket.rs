use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::benchmark::{BenchmarkComparison, ChartPoint};
use super::fund::{FundCategory, MetricSet, RiskCategory};
use super::score::ScoreBreakdown;

/// Requested risk appetite; also names the allocation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Label used when this level is offered next to the user's pick.
    pub fn alternative_label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Conservative Alternative",
            RiskLevel::Medium => "Balanced Alternative",
            RiskLevel::High => "Aggressive Alternative",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub category: FundCategory,
    pub weight: f64,
}

/// Fixed category → target weight table for a risk level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationStrategy {
    pub risk_level: RiskLevel,
    pub name: String,
    pub description: String,
    pub tag: String,
    pub weights: Vec<CategoryWeight>,
}

impl AllocationStrategy {
    pub fn weight_of(&self, category: FundCategory) -> f64 {
        self.weights
            .iter()
            .filter(|w| w.category == category)
            .map(|w| w.weight)
            .sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }

    pub fn info(&self) -> StrategyInfo {
        StrategyInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            tag: self.tag.clone(),
            risk_level: self.risk_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub tag: String,
    pub risk_level: RiskLevel,
}

/// One fund's placement inside a bucket. Metrics are copied by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundAllocation {
    pub symbol: String,
    pub name: String,
    pub category: FundCategory,
    pub risk_category: RiskCategory,
    pub scheme_code: Option<String>,
    /// Currency amount placed in this fund
    pub allocation: f64,
    /// Share of the requested amount, in percent
    pub percentage: f64,
    pub expected_return: f64,
    pub projected_value: f64,
    pub projected_gain: f64,
    pub final_score: f64,
    pub metrics: MetricSet,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub total_investment: f64,
    pub total_projected_value: f64,
    pub total_gain: f64,
    /// Weighted average expected return of the deployed funds
    pub overall_return: f64,
    /// `overall_return` in percent
    pub annualized_return: f64,
    /// Weighted annualized standard deviation, in percent
    pub risk_score: f64,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: FundCategory,
    pub total_allocation: f64,
    pub total_percentage: f64,
    pub funds: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diversification {
    pub fund_count: usize,
    pub category_count: usize,
}

/// Allocator output for one strategy, before benchmark annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub strategy: StrategyInfo,
    pub funds: Vec<FundAllocation>,
    pub summary: BucketSummary,
    pub category_summary: Vec<CategorySummary>,
    pub diversification: Diversification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketOption {
    pub strategy: StrategyInfo,
    pub label: String,
    pub is_recommended: bool,
    pub bucket: Vec<FundAllocation>,
    pub summary: BucketSummary,
    pub category_summary: Vec<CategorySummary>,
    pub diversification: Diversification,
    pub benchmark_comparison: Option<BenchmarkComparison>,
    pub chart_data: Option<Vec<ChartPoint>>,
}

impl BucketOption {
    pub fn from_bucket(bucket: Bucket, label: impl Into<String>, is_recommended: bool) -> Self {
        Self {
            strategy: bucket.strategy,
            label: label.into(),
            is_recommended,
            bucket: bucket.funds,
            summary: bucket.summary,
            category_summary: bucket.category_summary,
            diversification: bucket.diversification,
            benchmark_comparison: None,
            chart_data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerateBucketsRequest {
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default, alias = "riskLevel")]
    pub risk_level: RiskLevel,
}

fn default_amount() -> f64 {
    100_000.0
}

fn default_duration() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBucketsResponse {
    pub generated_at: DateTime<Utc>,
    pub input: GenerateBucketsRequest,
    pub bucket_options: Vec<BucketOption>,
    pub total_options: usize,
}
