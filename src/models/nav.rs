use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fund::FundCategory;

/// A published NAV for a scheme on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavRecord {
    pub scheme_code: String,
    pub scheme_name: String,
    pub category: FundCategory,
    pub nav: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(alias = "schemeCode")]
    pub scheme_code: String,
    pub units: f64,
    #[serde(alias = "investmentDate")]
    pub investment_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingReturn {
    pub scheme_code: String,
    pub scheme_name: String,
    pub category: FundCategory,
    pub units: f64,
    pub investment_date: NaiveDate,
    pub investment_nav: f64,
    pub current_date: NaiveDate,
    pub current_nav: f64,
    pub invested_amount: f64,
    pub current_value: f64,
    pub absolute_return: f64,
    /// Percent
    pub percentage_return: f64,
    /// Percent, 0 when the holding is younger than a day
    pub annualized_return: f64,
    pub days: i64,
}

/// Per-holding result; a missing NAV is reported inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoldingOutcome {
    Priced(HoldingReturn),
    Failed { scheme_code: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub total_return: f64,
    /// Percent
    pub portfolio_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturns {
    pub portfolio: PortfolioTotals,
    pub holdings: Vec<HoldingOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReturnWindow {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl ReturnWindow {
    pub const ALL: [ReturnWindow; 6] = [
        ReturnWindow::OneMonth,
        ReturnWindow::ThreeMonths,
        ReturnWindow::SixMonths,
        ReturnWindow::OneYear,
        ReturnWindow::ThreeYears,
        ReturnWindow::FiveYears,
    ];

    pub fn days(&self) -> i64 {
        match self {
            ReturnWindow::OneMonth => 30,
            ReturnWindow::ThreeMonths => 90,
            ReturnWindow::SixMonths => 180,
            ReturnWindow::OneYear => 365,
            ReturnWindow::ThreeYears => 1095,
            ReturnWindow::FiveYears => 1825,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReturn {
    /// Percent, rounded to 2 decimals
    pub absolute_return: f64,
    /// Percent, rounded to 2 decimals
    pub annualized_return: f64,
    pub start_date: NaiveDate,
    pub start_nav: f64,
    pub end_date: NaiveDate,
    pub end_nav: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemePeriodReturns {
    pub scheme_code: String,
    pub scheme_name: String,
    pub category: FundCategory,
    pub returns: BTreeMap<ReturnWindow, Option<WindowReturn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingBenchmarkWeight {
    pub category: FundCategory,
    pub benchmark_index: String,
    /// Invested amount backing this component
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsBenchmarkComparison {
    /// Percent
    pub portfolio_return: f64,
    /// Percent
    pub benchmark_return: f64,
    pub difference: f64,
    pub beats_benchmark: bool,
    pub holdings: Vec<HoldingReturn>,
    pub benchmark_components: Vec<HoldingBenchmarkWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cashflow {
    pub date: NaiveDate,
    /// Negative for investments, positive for redemptions
    pub amount: f64,
}
