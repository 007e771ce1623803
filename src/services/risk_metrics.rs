//! Risk-adjusted ratios over monthly return series.
//!
//! Every ratio annualizes the same way: `(1 + monthly_mean)^12 - 1` for the
//! return and `monthly_std * sqrt(12)` for volatility. Short or misaligned
//! input returns a neutral value (0, or 1 for beta) instead of an error.

use crate::models::MetricSet;
use crate::services::returns::{annualize_monthly_return, annualize_monthly_volatility, mean, std_dev};

/// Annual risk-free rate used when the caller has no configured value.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.06;

/// Compute the annualized Sharpe ratio.
///
/// Formula: (annual_return - risk_free_rate) / annual_std
///
/// # Arguments
/// * `returns` - Monthly return series
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.06 for 6%)
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std == 0.0 {
        return 0.0;
    }

    let annual_return = annualize_monthly_return(mean(returns));
    (annual_return - risk_free_rate) / annualize_monthly_volatility(std)
}

/// Compute the annualized Sortino ratio.
///
/// Only losing months contribute to the denominator: the downside deviation
/// is `sqrt(sum(r^2) / count)` over the negative returns. A series without a
/// single losing month falls back to the Sharpe ratio.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return sharpe_ratio(returns, risk_free_rate);
    }

    let downside_variance = downside.iter().map(|r| r * r).sum::<f64>() / downside.len() as f64;
    let annual_downside = annualize_monthly_volatility(downside_variance.sqrt());
    if annual_downside == 0.0 {
        return 0.0;
    }

    let annual_return = annualize_monthly_return(mean(returns));
    (annual_return - risk_free_rate) / annual_downside
}

/// Compute beta relative to an aligned market return series.
///
/// Uses population covariance and variance. Defaults to 1.0 (moves with the
/// market) when the series differ in length, have fewer than 2 points, or
/// the market never moves.
pub fn beta(fund_returns: &[f64], market_returns: &[f64]) -> f64 {
    if fund_returns.len() != market_returns.len() || fund_returns.len() < 2 {
        return 1.0;
    }

    let n = fund_returns.len() as f64;
    let fund_mean = mean(fund_returns);
    let market_mean = mean(market_returns);

    let (covariance, market_variance) = fund_returns.iter().zip(market_returns).fold(
        (0.0, 0.0),
        |(cov, var), (f, m)| {
            let dm = m - market_mean;
            (cov + (f - fund_mean) * dm, var + dm * dm)
        },
    );

    let market_variance = market_variance / n;
    if market_variance == 0.0 {
        return 1.0;
    }
    (covariance / n) / market_variance
}

/// Excess annual return per unit of beta.
pub fn treynor_ratio(returns: &[f64], beta: f64, risk_free_rate: f64) -> f64 {
    if returns.len() < 2 || beta == 0.0 {
        return 0.0;
    }
    let annual_return = annualize_monthly_return(mean(returns));
    (annual_return - risk_free_rate) / beta
}

/// Jensen's alpha: realized annual return minus the CAPM expectation.
pub fn alpha(fund_returns: &[f64], market_returns: &[f64], beta: f64, risk_free_rate: f64) -> f64 {
    if fund_returns.len() < 2 {
        return 0.0;
    }
    let fund_annual = annualize_monthly_return(mean(fund_returns));
    let market_annual = annualize_monthly_return(mean(market_returns));

    let expected = risk_free_rate + beta * (market_annual - risk_free_rate);
    fund_annual - expected
}

/// Annualized mean excess return over annualized tracking error.
pub fn information_ratio(fund_returns: &[f64], benchmark_returns: &[f64]) -> f64 {
    if fund_returns.len() != benchmark_returns.len() || fund_returns.len() < 2 {
        return 0.0;
    }

    let excess: Vec<f64> = fund_returns
        .iter()
        .zip(benchmark_returns)
        .map(|(f, b)| f - b)
        .collect();
    let tracking_error = std_dev(&excess);
    if tracking_error == 0.0 {
        return 0.0;
    }

    annualize_monthly_return(mean(&excess)) / annualize_monthly_volatility(tracking_error)
}

/// Annualized volatility of a monthly return series.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    annualize_monthly_volatility(std_dev(returns))
}

/// Build the full metric set of one fund.
///
/// `aligned` holds the fund's and the market's returns over the dates both
/// series share. Pass `None` when no market series is available, which
/// leaves beta at 1 and alpha and the information ratio at 0.
pub fn compute_metric_set(
    returns: &[f64],
    aligned: Option<(&[f64], &[f64])>,
    risk_free_rate: f64,
    expense_ratio: f64,
    turnover_ratio: f64,
) -> MetricSet {
    let (beta_value, alpha_value, info_ratio) = match aligned {
        Some((fund, market)) if fund.len() == market.len() && fund.len() >= 2 => {
            let b = beta(fund, market);
            (
                b,
                alpha(fund, market, b, risk_free_rate),
                information_ratio(fund, market),
            )
        }
        _ => (1.0, 0.0, 0.0),
    };

    MetricSet {
        sharpe_ratio: sharpe_ratio(returns, risk_free_rate),
        sortino_ratio: sortino_ratio(returns, risk_free_rate),
        beta: beta_value,
        treynor_ratio: treynor_ratio(returns, beta_value, risk_free_rate),
        alpha: alpha_value,
        information_ratio: info_ratio,
        standard_deviation: annualized_volatility(returns),
        expense_ratio,
        turnover_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RF: f64 = DEFAULT_RISK_FREE_RATE;

    #[test]
    fn test_short_series_returns_defaults() {
        for returns in [&[][..], &[0.02][..]] {
            assert_eq!(sharpe_ratio(returns, RF), 0.0);
            assert_eq!(sortino_ratio(returns, RF), 0.0);
            assert_eq!(beta(returns, returns), 1.0);
            assert_eq!(treynor_ratio(returns, 1.2, RF), 0.0);
            assert_eq!(alpha(returns, returns, 1.0, RF), 0.0);
            assert_eq!(information_ratio(returns, returns), 0.0);
            assert_eq!(annualized_volatility(returns), 0.0);
        }
    }

    #[test]
    fn test_metric_set_for_short_series_is_neutral() {
        let metrics = compute_metric_set(&[0.01], None, RF, 0.5, 0.2);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.beta, 1.0);
        assert_eq!(metrics.expense_ratio, 0.5);
        assert_eq!(metrics.turnover_ratio, 0.2);
    }

    #[test]
    fn test_sharpe_matches_monthly_convention() {
        let returns = [0.01, 0.02, 0.03, 0.02];
        let m = 0.02;
        let std = (0.0002f64 / 3.0).sqrt();
        let expected = ((1.0f64 + m).powi(12) - 1.0 - RF) / (std * 12f64.sqrt());

        assert!((sharpe_ratio(&returns, RF) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_zero_for_flat_returns() {
        assert_eq!(sharpe_ratio(&[0.25, 0.25, 0.25], RF), 0.0);
    }

    #[test]
    fn test_sortino_equals_sharpe_without_losing_months() {
        let returns = [0.01, 0.015, 0.0, 0.03, 0.02];
        assert_eq!(sortino_ratio(&returns, RF), sharpe_ratio(&returns, RF));
    }

    #[test]
    fn test_sortino_uses_downside_only() {
        let returns = [0.04, -0.02, 0.03, -0.02];
        let downside = (0.0008f64 / 2.0).sqrt() * 12f64.sqrt();
        let expected = ((1.0f64 + 0.0075).powi(12) - 1.0 - RF) / downside;

        assert!((sortino_ratio(&returns, RF) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_beta_of_scaled_series() {
        let market = [0.01, -0.02, 0.03, 0.005];
        let fund: Vec<f64> = market.iter().map(|m| m * 1.5).collect();
        assert!((beta(&fund, &market) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_beta_defaults() {
        assert_eq!(beta(&[0.01, 0.02], &[0.01]), 1.0);
        assert_eq!(beta(&[0.01, 0.02, 0.03], &[0.25, 0.25, 0.25]), 1.0);
    }

    #[test]
    fn test_treynor_zero_beta() {
        assert_eq!(treynor_ratio(&[0.01, 0.02], 0.0, RF), 0.0);
    }

    #[test]
    fn test_alpha_of_market_itself_is_zero() {
        let market = [0.01, -0.02, 0.03, 0.005];
        let b = beta(&market, &market);
        assert!(alpha(&market, &market, b, RF).abs() < 1e-12);
    }

    #[test]
    fn test_information_ratio_zero_tracking_error() {
        let market = [0.5, 0.25, 0.125];
        let fund: Vec<f64> = market.iter().map(|m| m + 0.0625).collect();
        assert_eq!(information_ratio(&fund, &market), 0.0);
    }

    #[test]
    fn test_metric_set_with_market_pair() {
        let market = [0.01, -0.02, 0.03, 0.005];
        let fund: Vec<f64> = market.iter().map(|m| m * 2.0).collect();
        let metrics = compute_metric_set(&fund, Some((&fund, &market)), RF, 0.0, 0.0);

        assert!((metrics.beta - 2.0).abs() < 1e-9);
        assert_eq!(metrics.treynor_ratio, treynor_ratio(&fund, metrics.beta, RF));
    }

    #[test]
    fn test_metric_set_without_market_uses_neutral_market_fields() {
        let returns = [0.02, -0.01, 0.03, 0.01];
        let metrics = compute_metric_set(&returns, None, RF, 1.0, 0.3);

        assert_eq!(metrics.beta, 1.0);
        assert_eq!(metrics.alpha, 0.0);
        assert_eq!(metrics.information_ratio, 0.0);
        assert_eq!(metrics.treynor_ratio, treynor_ratio(&returns, 1.0, RF));
        assert!(metrics.standard_deviation > 0.0);
    }
}
