use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use crate::external::fund_store::{NavSource, StoreError};
use crate::models::{IndexReturns, Period};
use crate::services::returns_cache::ReturnsCache;

/// Annual returns of a named market index.
///
/// A source may cover only some periods; `Ok(None)` means it knows nothing
/// about the index.
#[async_trait]
pub trait IndexReturnSource: Send + Sync {
    async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError>;
}

fn returns_of(one: f64, three: f64, five: f64, since_inception: f64) -> IndexReturns {
    IndexReturns::from([
        (Period::OneYear, one),
        (Period::ThreeYears, three),
        (Period::FiveYears, five),
        (Period::SinceInception, since_inception),
    ])
}

/// Approximate long-run returns of the Indian indices the engine maps to.
pub struct StaticIndexReturns;

impl StaticIndexReturns {
    pub fn lookup(index_name: &str) -> IndexReturns {
        match index_name {
            "NIFTY 50 TRI" => returns_of(0.18, 0.15, 0.14, 0.13),
            "NIFTY Midcap 150 TRI" => returns_of(0.25, 0.20, 0.18, 0.16),
            "NIFTY Smallcap 250 TRI" => returns_of(0.30, 0.22, 0.20, 0.18),
            "NIFTY 500 TRI" => returns_of(0.20, 0.17, 0.15, 0.14),
            "CRISIL Hybrid 35+ TRI" => returns_of(0.12, 0.11, 0.10, 0.09),
            "NIFTY 10yr G-Sec Index" => returns_of(0.07, 0.06, 0.06, 0.06),
            "NIFTY Liquid Index" => returns_of(0.05, 0.05, 0.05, 0.05),
            _ => returns_of(0.12, 0.11, 0.10, 0.10),
        }
    }
}

#[async_trait]
impl IndexReturnSource for StaticIndexReturns {
    async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError> {
        Ok(Some(Self::lookup(index_name)))
    }
}

/// Realized 1Y/3Y/5Y returns from an index NAV series keyed by index name.
///
/// Windows are anchored at the latest published index value.
pub struct NavIndexReturns {
    nav: Arc<dyn NavSource>,
}

impl NavIndexReturns {
    pub fn new(nav: Arc<dyn NavSource>) -> Self {
        Self { nav }
    }
}

#[async_trait]
impl IndexReturnSource for NavIndexReturns {
    async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError> {
        let Some(latest) = self.nav.latest_nav(index_name).await? else {
            return Ok(None);
        };

        let mut returns = IndexReturns::new();
        for period in Period::HISTORICAL {
            let Some(days) = period.days() else { continue };
            let start_date = latest.date - Duration::days(days);
            if let Some(start) = self.nav.nav_on_or_before(index_name, start_date).await? {
                if start.nav > 0.0 {
                    let total = (latest.nav - start.nav) / start.nav;
                    // annualize so the figure is comparable with the static table
                    let years = period.years(0) as f64;
                    returns.insert(period, (1.0 + total).powf(1.0 / years) - 1.0);
                }
            }
        }

        Ok(if returns.is_empty() { None } else { Some(returns) })
    }
}

/// Merges sources period by period, earlier sources winning.
pub struct IndexReturnChain {
    sources: Vec<Arc<dyn IndexReturnSource>>,
}

impl IndexReturnChain {
    pub fn new(sources: Vec<Arc<dyn IndexReturnSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl IndexReturnSource for IndexReturnChain {
    async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError> {
        let mut merged = IndexReturns::new();
        let mut last_error = None;

        for source in &self.sources {
            match source.index_returns(index_name).await {
                Ok(Some(returns)) => {
                    for (period, value) in returns {
                        merged.entry(period).or_insert(value);
                    }
                }
                Ok(None) => debug!("Index source had no data for {}", index_name),
                Err(e) => {
                    warn!("Index source failed for {}: {}. Trying next source.", index_name, e);
                    last_error = Some(e);
                }
            }

            if Period::ALL.iter().all(|p| merged.contains_key(p)) {
                break;
            }
        }

        match (merged.is_empty(), last_error) {
            (false, _) => Ok(Some(merged)),
            (true, Some(e)) => Err(e),
            (true, None) => Ok(None),
        }
    }
}

/// Wraps a source with the injected TTL cache.
pub struct CachedIndexReturns {
    inner: Arc<dyn IndexReturnSource>,
    cache: Arc<dyn ReturnsCache<IndexReturns>>,
    ttl: Duration,
}

impl CachedIndexReturns {
    pub fn new(
        inner: Arc<dyn IndexReturnSource>,
        cache: Arc<dyn ReturnsCache<IndexReturns>>,
        ttl: Duration,
    ) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(index_name: &str) -> String {
        format!("benchmark_{}", index_name)
    }
}

#[async_trait]
impl IndexReturnSource for CachedIndexReturns {
    async fn index_returns(&self, index_name: &str) -> Result<Option<IndexReturns>, StoreError> {
        let key = Self::cache_key(index_name);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Index returns cache hit for {}", index_name);
            return Ok(Some(hit));
        }

        let fetched = self.inner.index_returns(index_name).await?;
        if let Some(returns) = &fetched {
            info!("Caching index returns for {}", index_name);
            self.cache.set(&key, returns.clone(), self.ttl);
        }
        Ok(fetched)
    }
}
