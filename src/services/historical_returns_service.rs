use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::external::NavSource;
use crate::models::{BasketHolding, Period};

/// Share of a basket's funds (by count) that must have data for a period
/// to be reported.
const MIN_COVERAGE: f64 = 0.5;

/// Simple return of one scheme over the `days` before `as_of`.
///
/// Both ends use the nearest NAV on or before their date. A missing NAV,
/// or a lookup failure, yields `None`.
pub async fn fund_historical_return(
    nav: &dyn NavSource,
    scheme_code: &str,
    days: i64,
    as_of: NaiveDate,
) -> Option<f64> {
    let lookup = async {
        let end = nav.nav_on_or_before(scheme_code, as_of).await?;
        let start = nav
            .nav_on_or_before(scheme_code, as_of - Duration::days(days))
            .await?;
        Ok::<_, crate::external::StoreError>((start, end))
    };

    match lookup.await {
        Ok((Some(start), Some(end))) if start.nav > 0.0 => Some((end.nav - start.nav) / start.nav),
        Ok(_) => None,
        Err(e) => {
            warn!("NAV lookup failed for {}: {}", scheme_code, e);
            None
        }
    }
}

/// Scheme code of a basket fund, resolving it by symbol/name when absent.
pub async fn resolve_scheme_code(nav: &dyn NavSource, holding: &BasketHolding) -> Option<String> {
    if let Some(code) = holding.scheme_code.as_ref().filter(|c| !c.is_empty()) {
        return Some(code.clone());
    }

    match nav.find_scheme_code(&holding.symbol, holding.name.as_deref()).await {
        Ok(Some(code)) => Some(code),
        Ok(None) => {
            debug!("No scheme code found for fund: {}", holding.symbol);
            None
        }
        Err(e) => {
            warn!("Scheme code lookup failed for {}: {}", holding.symbol, e);
            None
        }
    }
}

/// Compound a simple return over `days` down to its annual rate.
fn annualize(simple_return: f64, days: i64) -> f64 {
    (1.0 + simple_return).powf(365.0 / days as f64) - 1.0
}

/// Realized 1Y/3Y/5Y annual returns of a basket from NAV history.
///
/// Each fund's window return is annualized, then weighted by percentage
/// over the funds that have data for the period. A period is reported only
/// when at least half the basket's funds have data.
/// Since-inception is never derived from NAVs and is always `None`.
pub async fn portfolio_historical_returns(
    nav: &dyn NavSource,
    basket: &[BasketHolding],
    as_of: NaiveDate,
) -> BTreeMap<Period, Option<f64>> {
    let codes: Vec<Option<String>> =
        join_all(basket.iter().map(|holding| resolve_scheme_code(nav, holding))).await;

    let mut returns = BTreeMap::new();
    for period in Period::ALL {
        let Some(days) = period.days() else {
            returns.insert(period, None);
            continue;
        };

        let fund_returns = join_all(codes.iter().map(|code| async move {
            match code {
                Some(code) => fund_historical_return(nav, code, days, as_of)
                    .await
                    .map(|r| annualize(r, days)),
                None => None,
            }
        }))
        .await;

        let mut weighted_return = 0.0;
        let mut total_weight = 0.0;
        let mut funds_with_data = 0usize;
        for (holding, fund_return) in basket.iter().zip(fund_returns) {
            if let Some(r) = fund_return {
                let weight = holding.percentage / 100.0;
                weighted_return += r * weight;
                total_weight += weight;
                funds_with_data += 1;
            }
        }

        let covered = funds_with_data as f64 >= basket.len() as f64 * MIN_COVERAGE;
        let value = if covered && total_weight > 0.0 {
            Some(weighted_return / total_weight)
        } else {
            debug!(
                "{}: {} of {} funds have NAV data, period not reported",
                period.label(),
                funds_with_data,
                basket.len()
            );
            None
        };
        returns.insert(period, value);
    }

    info!(
        "Historical basket returns over {} funds: {} periods usable",
        basket.len(),
        returns.values().filter(|v| v.is_some()).count()
    );
    returns
}
