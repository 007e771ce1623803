use std::sync::Arc;

use crate::config::EngineConfig;
use crate::external::{FundStore, IndexReturnSource, NavSource};
use crate::models::IndexReturns;
use crate::services::returns_cache::TtlCache;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FundStore>,
    pub nav: Arc<dyn NavSource>,
    pub index_returns: Arc<dyn IndexReturnSource>,
    /// Shared with the cached index-return source; exposed for maintenance
    pub benchmark_cache: TtlCache<IndexReturns>,
    pub config: EngineConfig,
}
