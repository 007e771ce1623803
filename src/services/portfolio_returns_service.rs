use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::{IndexReturnSource, NavSource};
use crate::models::{
    Cashflow, Holding, HoldingBenchmarkWeight, HoldingOutcome, HoldingReturn,
    HoldingsBenchmarkComparison, Period, PortfolioReturns, PortfolioTotals, ReturnWindow,
    SchemePeriodReturns, WindowReturn,
};
use crate::services::benchmark_service::benchmark_for_category;

/// 1Y index return assumed when a source has nothing for the index.
const FALLBACK_INDEX_RETURN: f64 = 0.12;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn price_holding(nav: &dyn NavSource, holding: &Holding) -> Result<HoldingReturn, String> {
    let invested_nav = nav
        .nav_on_or_before(&holding.scheme_code, holding.investment_date)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Investment NAV not found".to_string())?;
    let latest = nav
        .latest_nav(&holding.scheme_code)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Latest NAV not found".to_string())?;

    let invested_amount = holding.units * invested_nav.nav;
    if invested_amount <= 0.0 {
        return Err("Investment NAV is not positive".to_string());
    }
    let current_value = holding.units * latest.nav;
    let days = (latest.date - invested_nav.date).num_days();
    let years = days as f64 / 365.0;
    let annualized_return = if years > 0.0 {
        ((current_value / invested_amount).powf(1.0 / years) - 1.0) * 100.0
    } else {
        0.0
    };

    Ok(HoldingReturn {
        scheme_code: holding.scheme_code.clone(),
        scheme_name: latest.scheme_name,
        category: latest.category,
        units: holding.units,
        investment_date: invested_nav.date,
        investment_nav: invested_nav.nav,
        current_date: latest.date,
        current_nav: latest.nav,
        invested_amount,
        current_value,
        absolute_return: current_value - invested_amount,
        percentage_return: (current_value - invested_amount) / invested_amount * 100.0,
        annualized_return,
        days,
    })
}

/// Value each holding at its investment-date NAV and the latest NAV.
///
/// A holding that cannot be priced is reported inline with its error and
/// left out of the totals.
pub async fn portfolio_returns(nav: &dyn NavSource, holdings: &[Holding]) -> PortfolioReturns {
    let priced = join_all(holdings.iter().map(|h| price_holding(nav, h))).await;

    let mut total_invested = 0.0;
    let mut total_current_value = 0.0;
    let outcomes: Vec<HoldingOutcome> = holdings
        .iter()
        .zip(priced)
        .map(|(holding, result)| match result {
            Ok(r) => {
                total_invested += r.invested_amount;
                total_current_value += r.current_value;
                HoldingOutcome::Priced(r)
            }
            Err(error) => {
                warn!("Could not price holding {}: {}", holding.scheme_code, error);
                HoldingOutcome::Failed {
                    scheme_code: holding.scheme_code.clone(),
                    error,
                }
            }
        })
        .collect();

    let portfolio_return = if total_invested > 0.0 {
        (total_current_value - total_invested) / total_invested * 100.0
    } else {
        0.0
    };

    PortfolioReturns {
        portfolio: PortfolioTotals {
            total_invested,
            total_current_value,
            total_return: total_current_value - total_invested,
            portfolio_return,
        },
        holdings: outcomes,
    }
}

/// Trailing 1M to 5Y returns of one scheme, in percent rounded to 2 places.
///
/// Windows end at the latest NAV on or before `as_of`; a window with no NAV
/// at its start is `None`.
pub async fn period_returns(
    nav: &dyn NavSource,
    scheme_code: &str,
    as_of: NaiveDate,
) -> Result<SchemePeriodReturns, AppError> {
    let end = nav
        .nav_on_or_before(scheme_code, as_of)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scheme {} not found", scheme_code)))?;

    let mut returns = BTreeMap::new();
    for window in ReturnWindow::ALL {
        let days = window.days();
        let start = nav
            .nav_on_or_before(scheme_code, end.date - Duration::days(days))
            .await?
            .filter(|s| s.nav > 0.0);

        let value = start.map(|start| {
            let years = days as f64 / 365.0;
            let absolute = (end.nav - start.nav) / start.nav * 100.0;
            let annualized = ((end.nav / start.nav).powf(1.0 / years) - 1.0) * 100.0;
            WindowReturn {
                absolute_return: round2(absolute),
                annualized_return: round2(annualized),
                start_date: start.date,
                start_nav: start.nav,
                end_date: end.date,
                end_nav: end.nav,
            }
        });
        returns.insert(window, value);
    }

    Ok(SchemePeriodReturns {
        scheme_code: scheme_code.to_string(),
        scheme_name: end.scheme_name,
        category: end.category,
        returns,
    })
}

/// Priced holdings against the 1Y return of each holding's category index,
/// both weighted by invested amount and expressed in percent.
pub async fn compare_holdings_with_benchmark(
    nav: &dyn NavSource,
    index_returns: &dyn IndexReturnSource,
    holdings: &[Holding],
) -> Result<HoldingsBenchmarkComparison, AppError> {
    let priced: Vec<HoldingReturn> = portfolio_returns(nav, holdings)
        .await
        .holdings
        .into_iter()
        .filter_map(|outcome| match outcome {
            HoldingOutcome::Priced(r) => Some(r),
            HoldingOutcome::Failed { .. } => None,
        })
        .collect();

    let total_invested: f64 = priced.iter().map(|h| h.invested_amount).sum();
    if priced.is_empty() || total_invested <= 0.0 {
        return Err(AppError::NotFound(
            "None of the holdings could be priced from NAV history".to_string(),
        ));
    }

    let portfolio_return: f64 = priced
        .iter()
        .map(|h| h.percentage_return * h.invested_amount / total_invested)
        .sum();

    let mut components = Vec::with_capacity(priced.len());
    let mut benchmark_return = 0.0;
    for holding in &priced {
        let index = benchmark_for_category(holding.category);
        let one_year = index_returns
            .index_returns(index)
            .await?
            .and_then(|r| r.get(&Period::OneYear).copied())
            .unwrap_or(FALLBACK_INDEX_RETURN);

        benchmark_return += one_year * holding.invested_amount / total_invested * 100.0;
        components.push(HoldingBenchmarkWeight {
            category: holding.category,
            benchmark_index: index.to_string(),
            weight: holding.invested_amount,
        });
    }

    let difference = portfolio_return - benchmark_return;
    info!(
        "Holdings vs benchmark: {:.2}% vs {:.2}% over {} holdings",
        portfolio_return,
        benchmark_return,
        priced.len()
    );

    Ok(HoldingsBenchmarkComparison {
        portfolio_return,
        benchmark_return,
        difference,
        beats_benchmark: difference > 0.0,
        holdings: priced,
        benchmark_components: components,
    })
}

/// Rough annualized return of a cashflow history.
///
/// Outflows (negative amounts) are money invested and inflows money
/// redeemed; the ratio is annualized over the first-to-last span. Returns
/// 0 with fewer than two flows, a zero span, or nothing invested.
pub fn approximate_xirr(cashflows: &[Cashflow]) -> f64 {
    if cashflows.len() < 2 {
        return 0.0;
    }

    let (Some(first), Some(last)) = (
        cashflows.iter().map(|c| c.date).min(),
        cashflows.iter().map(|c| c.date).max(),
    ) else {
        return 0.0;
    };
    let years = (last - first).num_days() as f64 / 365.0;
    if years <= 0.0 {
        return 0.0;
    }

    let invested: f64 = cashflows.iter().filter(|c| c.amount < 0.0).map(|c| -c.amount).sum();
    let redeemed: f64 = cashflows.iter().filter(|c| c.amount > 0.0).map(|c| c.amount).sum();
    if invested == 0.0 {
        return 0.0;
    }

    (redeemed / invested).powf(1.0 / years) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{InMemoryStore, StaticIndexReturns};
    use crate::models::FundCategory;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_nav_history(
                "100",
                "Alpha Large Cap Fund",
                FundCategory::LargeCap,
                &[(d(2023, 1, 1), 40.0), (d(2024, 1, 1), 50.0), (d(2025, 1, 1), 60.0)],
            )
            .with_nav_history(
                "200",
                "Beta Liquid Fund",
                FundCategory::Liquid,
                &[(d(2024, 1, 1), 10.0), (d(2024, 12, 31), 10.5)],
            )
    }

    #[tokio::test]
    async fn test_portfolio_returns_totals_and_inline_errors() {
        let holdings = vec![
            Holding {
                scheme_code: "100".into(),
                units: 10.0,
                investment_date: d(2024, 1, 1),
            },
            Holding {
                scheme_code: "100".into(),
                units: 1.0,
                investment_date: d(2020, 1, 1),
            },
        ];

        let result = portfolio_returns(&store(), &holdings).await;
        assert_eq!(result.portfolio.total_invested, 500.0);
        assert_eq!(result.portfolio.total_current_value, 600.0);
        assert!((result.portfolio.portfolio_return - 20.0).abs() < 1e-9);

        match &result.holdings[0] {
            HoldingOutcome::Priced(r) => {
                assert_eq!(r.days, 366);
                assert_eq!(r.scheme_name, "Alpha Large Cap Fund");
            }
            other => panic!("expected priced holding, got {:?}", other),
        }
        assert!(matches!(
            &result.holdings[1],
            HoldingOutcome::Failed { error, .. } if error == "Investment NAV not found"
        ));
    }

    #[tokio::test]
    async fn test_period_returns_windows() {
        let returns = period_returns(&store(), "100", d(2025, 6, 1)).await.unwrap();

        let one_year = returns.returns[&ReturnWindow::OneYear].as_ref().unwrap();
        assert_eq!(one_year.absolute_return, 20.0);
        assert_eq!(one_year.end_date, d(2025, 1, 1));
        assert!(returns.returns[&ReturnWindow::FiveYears].is_none());
    }

    #[tokio::test]
    async fn test_period_returns_unknown_scheme() {
        let err = period_returns(&store(), "999", d(2025, 1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_holdings_vs_benchmark_weighted_by_invested() {
        let holdings = vec![
            Holding {
                scheme_code: "100".into(),
                units: 10.0,
                investment_date: d(2024, 1, 1),
            },
            Holding {
                scheme_code: "200".into(),
                units: 50.0,
                investment_date: d(2024, 1, 1),
            },
        ];

        let cmp = compare_holdings_with_benchmark(&store(), &StaticIndexReturns, &holdings)
            .await
            .unwrap();

        // 500 invested at +20%, 500 invested at +5%
        assert!((cmp.portfolio_return - 12.5).abs() < 1e-9);
        // NIFTY 50 TRI 18% and NIFTY Liquid Index 5%, equal weights
        assert!((cmp.benchmark_return - 11.5).abs() < 1e-9);
        assert!(cmp.beats_benchmark);
        assert_eq!(cmp.benchmark_components[1].benchmark_index, "NIFTY Liquid Index");
    }

    #[tokio::test]
    async fn test_holdings_vs_benchmark_needs_a_priced_holding() {
        let holdings = vec![Holding {
            scheme_code: "404".into(),
            units: 1.0,
            investment_date: d(2024, 1, 1),
        }];
        let result = compare_holdings_with_benchmark(&store(), &StaticIndexReturns, &holdings).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_approximate_xirr() {
        let flows = vec![
            Cashflow { date: d(2023, 1, 1), amount: -1000.0 },
            Cashflow { date: d(2024, 1, 1), amount: 1100.0 },
        ];
        assert!((approximate_xirr(&flows) - 0.10).abs() < 1e-9);

        assert_eq!(approximate_xirr(&flows[..1]), 0.0);
        let same_day = vec![
            Cashflow { date: d(2024, 1, 1), amount: -10.0 },
            Cashflow { date: d(2024, 1, 1), amount: 12.0 },
        ];
        assert_eq!(approximate_xirr(&same_day), 0.0);
    }
}
