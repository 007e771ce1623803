use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct FundRow {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub risk_category: String,
    pub scheme_code: Option<String>,
    pub expense_ratio: Option<f64>,
    pub turnover_ratio: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PriceRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
}

/// All funds of one type, ordered by symbol.
pub async fn fetch_funds(pool: &PgPool, fund_type: &str) -> Result<Vec<FundRow>, sqlx::Error> {
    sqlx::query_as::<_, FundRow>(
        r#"
        SELECT
            symbol,
            name,
            category,
            risk_category,
            scheme_code,
            expense_ratio,
            turnover_ratio
        FROM funds
        WHERE fund_type = $1
        ORDER BY symbol
        "#,
    )
    .bind(fund_type)
    .fetch_all(pool)
    .await
}

/// Price history of the given symbols, oldest first per symbol.
pub async fn fetch_prices(pool: &PgPool, symbols: &[String]) -> Result<Vec<PriceRow>, sqlx::Error> {
    sqlx::query_as::<_, PriceRow>(
        r#"
        SELECT symbol, date, close
        FROM fund_prices
        WHERE symbol = ANY($1)
        ORDER BY symbol, date ASC
        "#,
    )
    .bind(symbols)
    .fetch_all(pool)
    .await
}
