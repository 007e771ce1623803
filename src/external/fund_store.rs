use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{FundRecord, FundType, NavRecord, PricePoint};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Source of the fund universe.
#[async_trait]
pub trait FundStore: Send + Sync {
    async fn list_funds(&self, fund_type: FundType) -> Result<Vec<FundRecord>, StoreError>;

    /// Price history of the market proxy used for beta, alpha and the
    /// information ratio. `None` when no proxy is configured.
    async fn market_history(&self) -> Result<Option<Vec<PricePoint>>, StoreError> {
        Ok(None)
    }
}

/// Point lookups into NAV history.
#[async_trait]
pub trait NavSource: Send + Sync {
    async fn latest_nav(&self, scheme_code: &str) -> Result<Option<NavRecord>, StoreError>;

    /// Nearest NAV published on or before `date`.
    async fn nav_on_or_before(
        &self,
        scheme_code: &str,
        date: NaiveDate,
    ) -> Result<Option<NavRecord>, StoreError>;

    /// Resolve the scheme code of a fund known only by symbol and name.
    async fn find_scheme_code(
        &self,
        symbol: &str,
        _name: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(symbol.to_string()));
        }
        Ok(None)
    }
}
