use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::error;

use crate::db::{fund_queries, nav_queries};
use crate::external::{FundStore, NavSource, StoreError};
use crate::models::{FundCategory, FundRecord, FundType, NavRecord, PricePoint, RiskCategory};

/// Postgres-backed fund universe and NAV history.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_error(context: &str, e: sqlx::Error) -> StoreError {
    error!("{} failed: {}", context, e);
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{}: {}", context, e))
        }
        other => StoreError::Database(other),
    }
}

fn parse_risk_category(raw: &str) -> RiskCategory {
    match raw.trim().to_lowercase().as_str() {
        "low" => RiskCategory::Low,
        "high" => RiskCategory::High,
        _ => RiskCategory::Medium,
    }
}

impl From<nav_queries::NavRow> for NavRecord {
    fn from(row: nav_queries::NavRow) -> Self {
        Self {
            category: FundCategory::normalize(&row.category),
            scheme_code: row.scheme_code,
            scheme_name: row.scheme_name,
            nav: row.nav,
            date: row.date,
        }
    }
}

#[async_trait]
impl FundStore for PgStore {
    async fn list_funds(&self, fund_type: FundType) -> Result<Vec<FundRecord>, StoreError> {
        let funds = fund_queries::fetch_funds(&self.pool, fund_type.as_str())
            .await
            .map_err(|e| query_error("fetch_funds", e))?;

        let symbols: Vec<String> = funds.iter().map(|f| f.symbol.clone()).collect();
        let prices = fund_queries::fetch_prices(&self.pool, &symbols)
            .await
            .map_err(|e| query_error("fetch_prices", e))?;

        let mut history: HashMap<String, Vec<PricePoint>> = HashMap::new();
        for row in prices {
            history
                .entry(row.symbol)
                .or_default()
                .push(PricePoint::new(row.date, row.close));
        }

        Ok(funds
            .into_iter()
            .map(|row| FundRecord {
                price_history: history.remove(&row.symbol).unwrap_or_default(),
                category: FundCategory::normalize(&row.category),
                risk_category: parse_risk_category(&row.risk_category),
                symbol: row.symbol,
                name: row.name,
                scheme_code: row.scheme_code,
                expense_ratio: row.expense_ratio,
                turnover_ratio: row.turnover_ratio,
            })
            .collect())
    }
}

#[async_trait]
impl NavSource for PgStore {
    async fn latest_nav(&self, scheme_code: &str) -> Result<Option<NavRecord>, StoreError> {
        nav_queries::fetch_latest(&self.pool, scheme_code)
            .await
            .map(|row| row.map(NavRecord::from))
            .map_err(|e| query_error("fetch_latest_nav", e))
    }

    async fn nav_on_or_before(
        &self,
        scheme_code: &str,
        date: NaiveDate,
    ) -> Result<Option<NavRecord>, StoreError> {
        nav_queries::fetch_on_or_before(&self.pool, scheme_code, date)
            .await
            .map(|row| row.map(NavRecord::from))
            .map_err(|e| query_error("fetch_nav_on_or_before", e))
    }

    async fn find_scheme_code(
        &self,
        symbol: &str,
        name: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(symbol.to_string()));
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        nav_queries::find_scheme_code(&self.pool, symbol, name)
            .await
            .map_err(|e| query_error("find_scheme_code", e))
    }
}
