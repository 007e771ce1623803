use std::fmt;

use serde::{Deserialize, Serialize};

use super::price_point::{PricePoint, PriceSeries};

/// Closed set of fund categories the allocator and benchmark engine know.
///
/// Strings coming from the data store go through [`FundCategory::normalize`];
/// anything unrecognised lands in `Other` instead of silently matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FundCategory {
    LargeCap,
    MidCap,
    SmallCap,
    FlexiCap,
    Balanced,
    Debt,
    Liquid,
    Index,
    Elss,
    Other,
}

impl FundCategory {
    pub const ALL: [FundCategory; 10] = [
        FundCategory::LargeCap,
        FundCategory::MidCap,
        FundCategory::SmallCap,
        FundCategory::FlexiCap,
        FundCategory::Balanced,
        FundCategory::Debt,
        FundCategory::Liquid,
        FundCategory::Index,
        FundCategory::Elss,
        FundCategory::Other,
    ];

    pub fn normalize(raw: &str) -> Self {
        let key = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "large_cap" | "largecap" => FundCategory::LargeCap,
            "mid_cap" | "midcap" => FundCategory::MidCap,
            "small_cap" | "smallcap" => FundCategory::SmallCap,
            "flexi_cap" | "flexicap" => FundCategory::FlexiCap,
            "balanced" => FundCategory::Balanced,
            "debt" => FundCategory::Debt,
            "liquid" => FundCategory::Liquid,
            "index" => FundCategory::Index,
            "elss" => FundCategory::Elss,
            _ => FundCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FundCategory::LargeCap => "large_cap",
            FundCategory::MidCap => "mid_cap",
            FundCategory::SmallCap => "small_cap",
            FundCategory::FlexiCap => "flexi_cap",
            FundCategory::Balanced => "balanced",
            FundCategory::Debt => "debt",
            FundCategory::Liquid => "liquid",
            FundCategory::Index => "index",
            FundCategory::Elss => "elss",
            FundCategory::Other => "other",
        }
    }
}

impl From<String> for FundCategory {
    fn from(value: String) -> Self {
        FundCategory::normalize(&value)
    }
}

impl fmt::Display for FundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    MutualFund,
    Stock,
    Fd,
}

impl FundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundType::MutualFund => "mutual_fund",
            FundType::Stock => "stock",
            FundType::Fd => "fd",
        }
    }
}

/// A fund as handed over by the storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRecord {
    pub symbol: String,
    pub name: String,
    pub category: FundCategory,
    #[serde(default)]
    pub risk_category: RiskCategory,
    #[serde(default)]
    pub scheme_code: Option<String>,
    #[serde(default)]
    pub expense_ratio: Option<f64>,
    #[serde(default)]
    pub turnover_ratio: Option<f64>,
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

/// Risk-adjusted metrics for one fund, computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub beta: f64,
    pub treynor_ratio: f64,
    pub alpha: f64,
    pub information_ratio: f64,
    /// Annualized volatility (monthly std × √12)
    pub standard_deviation: f64,
    pub expense_ratio: f64,
    pub turnover_ratio: f64,
}

impl Default for MetricSet {
    fn default() -> Self {
        Self {
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            beta: 1.0,
            treynor_ratio: 0.0,
            alpha: 0.0,
            information_ratio: 0.0,
            standard_deviation: 0.0,
            expense_ratio: 0.0,
            turnover_ratio: 0.0,
        }
    }
}

/// A scorable fund. Built once per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundCandidate {
    pub symbol: String,
    pub name: String,
    pub category: FundCategory,
    pub risk_category: RiskCategory,
    pub scheme_code: Option<String>,
    pub price_series: PriceSeries,
    /// CAGR of the price series, used as the expected annual return
    pub derived_return: f64,
    pub metrics: MetricSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_normalization() {
        assert_eq!(FundCategory::normalize("Large-Cap"), FundCategory::LargeCap);
        assert_eq!(FundCategory::normalize(" mid cap "), FundCategory::MidCap);
        assert_eq!(FundCategory::normalize("ELSS"), FundCategory::Elss);
        assert_eq!(FundCategory::normalize("hybrid_conservative"), FundCategory::Other);
        assert_eq!(FundCategory::normalize(""), FundCategory::Other);
    }

    #[test]
    fn test_category_deserializes_unknown_as_other() {
        let cat: FundCategory = serde_json::from_str("\"contra\"").unwrap();
        assert_eq!(cat, FundCategory::Other);

        let cat: FundCategory = serde_json::from_str("\"small_cap\"").unwrap();
        assert_eq!(cat, FundCategory::SmallCap);
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"small_cap\"");
    }

    #[test]
    fn test_fund_record_optional_fields_default() {
        let record: FundRecord = serde_json::from_str(
            r#"{"symbol":"ABC","name":"Alpha Bluechip","category":"large_cap"}"#,
        )
        .unwrap();

        assert_eq!(record.risk_category, RiskCategory::Medium);
        assert!(record.price_history.is_empty());
        assert!(record.expense_ratio.is_none());
    }
}
