//! Return series, summary statistics and CAGR from a price/NAV series.
//!
//! Nothing here fails on short input: fewer than two prices yields `None`
//! from [`compute_returns`] and zero from the scalar helpers.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{FundCategory, PricePoint, PriceSeries};

/// Simple period-over-period returns `(p[i] - p[i-1]) / p[i-1]`.
pub fn compute_returns(series: &PriceSeries) -> Option<Vec<f64>> {
    if series.len() < 2 {
        return None;
    }
    Some(returns_from_closes(&series.closes()))
}

fn returns_from_closes(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor n - 1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// Compound annual growth rate over the series' calendar span (365-day years).
pub fn cagr(series: &PriceSeries) -> f64 {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    if series.len() < 2 {
        return 0.0;
    }

    let years = (last.date - first.date).num_days() as f64 / 365.0;
    if years <= 0.0 {
        return 0.0;
    }

    (last.close / first.close).powf(1.0 / years) - 1.0
}

/// Monthly mean return compounded to a year.
pub fn annualize_monthly_return(monthly_mean: f64) -> f64 {
    (1.0 + monthly_mean).powi(12) - 1.0
}

/// Monthly standard deviation scaled to a year.
pub fn annualize_monthly_volatility(monthly_std: f64) -> f64 {
    monthly_std * 12f64.sqrt()
}

/// Returns of two series over the dates they share, so both sides line up
/// period by period.
pub fn aligned_returns(series: &PriceSeries, other: &[PricePoint]) -> (Vec<f64>, Vec<f64>) {
    let other_by_date: HashMap<NaiveDate, f64> = other
        .iter()
        .filter(|p| p.close.is_finite() && p.close > 0.0)
        .map(|p| (p.date, p.close))
        .collect();

    let (left, right): (Vec<f64>, Vec<f64>) = series
        .points()
        .iter()
        .filter_map(|p| other_by_date.get(&p.date).map(|o| (p.close, *o)))
        .unzip();

    if left.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    (returns_from_closes(&left), returns_from_closes(&right))
}

/// Plausible band for a category's expected annual return.
pub fn expected_return_bounds(category: FundCategory) -> (f64, f64) {
    match category {
        FundCategory::Liquid => (0.03, 0.07),
        FundCategory::Debt => (0.05, 0.09),
        FundCategory::Balanced => (0.08, 0.13),
        FundCategory::Index => (0.09, 0.14),
        FundCategory::LargeCap => (0.09, 0.15),
        FundCategory::FlexiCap | FundCategory::Elss => (0.10, 0.16),
        FundCategory::MidCap => (0.10, 0.18),
        FundCategory::SmallCap => (0.10, 0.20),
        FundCategory::Other => (0.05, 0.12),
    }
}

/// Clamp a historical CAGR into its category band.
pub fn bounded_expected_return(cagr: f64, category: FundCategory) -> f64 {
    let (min, max) = expected_return_bounds(category);
    cagr.clamp(min, max)
}
