use serde::{Deserialize, Serialize};

use super::fund::{FundCandidate, MetricSet};

/// Each metric normalized to [0, 1] against the scoring population.
///
/// Lower-is-better metrics (sd, beta deviation, expense, turnover) are
/// already inverted, so 1.0 is always the best value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    pub sharpe: f64,
    pub sortino: f64,
    pub treynor: f64,
    pub alpha: f64,
    pub info_ratio: f64,
    pub sd: f64,
    pub beta: f64,
    pub expense: f64,
    pub turnover: f64,
}

/// Explainable composite score of a fund.
///
/// Sub-scores carry their internal weights (their maxima are 0.45, 0.25,
/// 0.20 and 0.10) and `final_score` re-weights them by category total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub final_score: f64,
    pub risk_adjusted_score: f64,
    pub stability_score: f64,
    pub manager_skill_score: f64,
    pub cost_efficiency_score: f64,
    pub normalized: NormalizedMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFund {
    pub candidate: FundCandidate,
    pub metrics: MetricSet,
    pub score_breakdown: ScoreBreakdown,
}

impl ScoredFund {
    pub fn final_score(&self) -> f64 {
        self.score_breakdown.final_score
    }
}
