use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::external::fund_store::{FundStore, NavSource, StoreError};
use crate::models::{FundCategory, FundRecord, FundType, NavRecord, PricePoint};

/// In-process fund universe and NAV history.
///
/// Used by tests and local demos; the Postgres store backs production.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    funds: Vec<FundRecord>,
    market: Option<Vec<PricePoint>>,
    // scheme code -> NAVs sorted by date ascending
    navs: HashMap<String, Vec<NavRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_funds(mut self, funds: Vec<FundRecord>) -> Self {
        self.funds = funds;
        self
    }

    pub fn with_market_history(mut self, history: Vec<PricePoint>) -> Self {
        self.market = Some(history);
        self
    }

    pub fn with_nav_history(
        mut self,
        scheme_code: &str,
        scheme_name: &str,
        category: FundCategory,
        points: &[(NaiveDate, f64)],
    ) -> Self {
        let entry = self.navs.entry(scheme_code.to_string()).or_default();
        entry.extend(points.iter().map(|(date, nav)| NavRecord {
            scheme_code: scheme_code.to_string(),
            scheme_name: scheme_name.to_string(),
            category,
            nav: *nav,
            date: *date,
        }));
        entry.sort_by_key(|r| r.date);
        entry.dedup_by_key(|r| r.date);
        self
    }
}

#[async_trait]
impl FundStore for InMemoryStore {
    async fn list_funds(&self, fund_type: FundType) -> Result<Vec<FundRecord>, StoreError> {
        // Only mutual funds are modelled in memory
        match fund_type {
            FundType::MutualFund => Ok(self.funds.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn market_history(&self) -> Result<Option<Vec<PricePoint>>, StoreError> {
        Ok(self.market.clone())
    }
}

#[async_trait]
impl NavSource for InMemoryStore {
    async fn latest_nav(&self, scheme_code: &str) -> Result<Option<NavRecord>, StoreError> {
        Ok(self.navs.get(scheme_code).and_then(|h| h.last().cloned()))
    }

    async fn nav_on_or_before(
        &self,
        scheme_code: &str,
        date: NaiveDate,
    ) -> Result<Option<NavRecord>, StoreError> {
        let Some(history) = self.navs.get(scheme_code) else {
            return Ok(None);
        };
        let idx = history.partition_point(|r| r.date <= date);
        Ok(idx.checked_sub(1).map(|i| history[i].clone()))
    }

    async fn find_scheme_code(
        &self,
        symbol: &str,
        name: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(symbol.to_string()));
        }
        if self.navs.contains_key(symbol) {
            return Ok(Some(symbol.to_string()));
        }

        let Some(name) = name.map(str::to_lowercase).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let mut matches: Vec<&String> = self
            .navs
            .iter()
            .filter(|(_, history)| {
                history
                    .last()
                    .is_some_and(|r| r.scheme_name.to_lowercase().contains(&name))
            })
            .map(|(code, _)| code)
            .collect();
        // HashMap order is arbitrary; pick the smallest code for stable results
        matches.sort();
        Ok(matches.first().map(|code| (*code).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_nav_history(
            "120503",
            "Axis Bluechip Fund - Direct Growth",
            FundCategory::LargeCap,
            &[(d(2024, 1, 1), 40.0), (d(2024, 6, 1), 44.0), (d(2025, 1, 1), 48.0)],
        )
    }

    #[tokio::test]
    async fn test_nav_on_or_before_picks_nearest_previous() {
        let store = store();

        let nav = store.nav_on_or_before("120503", d(2024, 7, 15)).await.unwrap().unwrap();
        assert_eq!(nav.date, d(2024, 6, 1));

        let exact = store.nav_on_or_before("120503", d(2025, 1, 1)).await.unwrap().unwrap();
        assert_eq!(exact.nav, 48.0);

        assert!(store.nav_on_or_before("120503", d(2023, 12, 31)).await.unwrap().is_none());
        assert!(store.nav_on_or_before("999", d(2025, 1, 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_nav() {
        let latest = store().latest_nav("120503").await.unwrap().unwrap();
        assert_eq!(latest.date, d(2025, 1, 1));
    }

    #[tokio::test]
    async fn test_find_scheme_code_by_symbol_or_name() {
        let store = store();
        assert_eq!(store.find_scheme_code("118989", None).await.unwrap().as_deref(), Some("118989"));
        assert_eq!(
            store.find_scheme_code("AXISBLUE", Some("axis bluechip")).await.unwrap().as_deref(),
            Some("120503")
        );
        assert!(store.find_scheme_code("NOPE", Some("unknown fund")).await.unwrap().is_none());
    }
}
