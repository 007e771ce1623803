use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{FundCategory, MetricSet, ScoreBreakdown, ScoredFund};
use crate::services::bucket_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/score", post(score))
}

#[derive(Debug, Serialize)]
pub struct FundScoreEntry {
    pub symbol: String,
    pub name: String,
    pub category: FundCategory,
    pub expected_return: f64,
    pub metrics: MetricSet,
    pub score_breakdown: ScoreBreakdown,
}

impl From<ScoredFund> for FundScoreEntry {
    fn from(fund: ScoredFund) -> Self {
        Self {
            symbol: fund.candidate.symbol,
            name: fund.candidate.name,
            category: fund.candidate.category,
            expected_return: fund.candidate.derived_return,
            metrics: fund.metrics,
            score_breakdown: fund.score_breakdown,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FundScoresResponse {
    pub total_funds: usize,
    pub funds: Vec<FundScoreEntry>,
}

/// POST /api/funds/score
///
/// Scores the whole mutual fund universe, best first.
pub async fn score(State(state): State<AppState>) -> Result<Json<FundScoresResponse>, AppError> {
    info!("POST /api/funds/score - Scoring fund universe");

    let mut scored = bucket_service::score_universe(state.store.as_ref(), &state.config).await?;
    scored.sort_by(|a, b| {
        b.final_score()
            .total_cmp(&a.final_score())
            .then_with(|| a.candidate.symbol.cmp(&b.candidate.symbol))
    });

    let funds: Vec<FundScoreEntry> = scored.into_iter().map(FundScoreEntry::from).collect();
    info!("Scored {} funds", funds.len());

    Ok(Json(FundScoresResponse {
        total_funds: funds.len(),
        funds,
    }))
}
