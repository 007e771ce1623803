use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{GenerateBucketsRequest, GenerateBucketsResponse};
use crate::services::bucket_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

/// POST /api/buckets/generate
///
/// Body: `{amount, duration, riskLevel}`; every field is optional and
/// defaults to 100000 / 3 / medium.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateBucketsRequest>,
) -> Result<Json<GenerateBucketsResponse>, AppError> {
    info!(
        "POST /api/buckets/generate - amount={}, duration={}, risk_level={}",
        request.amount, request.duration, request.risk_level
    );

    let response = bucket_service::generate_buckets(
        state.store.as_ref(),
        state.nav.clone(),
        state.index_returns.as_ref(),
        &state.config,
        request,
        Utc::now().date_naive(),
    )
    .await
    .map_err(|e| {
        error!("Bucket generation failed: {}", e);
        e
    })?;

    Ok(Json(response))
}
