use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct NavRow {
    pub scheme_code: String,
    pub scheme_name: String,
    pub category: String,
    pub nav: f64,
    pub date: NaiveDate,
}

pub async fn fetch_latest(pool: &PgPool, scheme_code: &str) -> Result<Option<NavRow>, sqlx::Error> {
    sqlx::query_as::<_, NavRow>(
        r#"
        SELECT scheme_code, scheme_name, category, nav, date
        FROM nav_history
        WHERE scheme_code = $1
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(scheme_code)
    .fetch_optional(pool)
    .await
}

/// Nearest NAV published on or before `date`.
pub async fn fetch_on_or_before(
    pool: &PgPool,
    scheme_code: &str,
    date: NaiveDate,
) -> Result<Option<NavRow>, sqlx::Error> {
    sqlx::query_as::<_, NavRow>(
        r#"
        SELECT scheme_code, scheme_name, category, nav, date
        FROM nav_history
        WHERE scheme_code = $1 AND date <= $2
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(scheme_code)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Scheme code whose code equals `symbol` or whose name contains `name`
/// (case-insensitive). The lowest matching code wins.
pub async fn find_scheme_code(
    pool: &PgPool,
    symbol: &str,
    name: Option<&str>,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT scheme_code
        FROM nav_history
        WHERE scheme_code = $1
           OR ($2::text IS NOT NULL AND scheme_name ILIKE '%' || $2 || '%')
        GROUP BY scheme_code
        ORDER BY (scheme_code = $1) DESC, scheme_code
        LIMIT 1
        "#,
    )
    .bind(symbol)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(code,)| code))
}
