use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::models::{PortfolioReturns, SchemePeriodReturns};
use crate::routes::benchmark::HoldingsRequest;
use crate::services::portfolio_returns_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/returns", post(holdings_returns))
        .route("/returns/:scheme_code", get(scheme_returns))
}

/// POST /api/portfolio/returns
///
/// Holdings that cannot be priced come back inline with an `error`.
pub async fn holdings_returns(
    State(state): State<AppState>,
    Json(request): Json<HoldingsRequest>,
) -> Result<Json<PortfolioReturns>, AppError> {
    info!("POST /api/portfolio/returns - {} holdings", request.holdings.len());

    if request.holdings.is_empty() {
        return Err(AppError::Validation("holdings must not be empty".to_string()));
    }

    let returns = portfolio_returns_service::portfolio_returns(state.nav.as_ref(), &request.holdings).await;
    Ok(Json(returns))
}

/// GET /api/portfolio/returns/:scheme_code
pub async fn scheme_returns(
    Path(scheme_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SchemePeriodReturns>, AppError> {
    info!("GET /api/portfolio/returns/{} - Trailing returns", scheme_code);

    let returns = portfolio_returns_service::period_returns(
        state.nav.as_ref(),
        &scheme_code,
        Utc::now().date_naive(),
    )
    .await?;

    Ok(Json(returns))
}
