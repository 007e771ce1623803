pub mod fund_store;
pub mod index_returns;
pub mod memory_store;

pub use fund_store::{FundStore, NavSource, StoreError};
pub use index_returns::{
    CachedIndexReturns, IndexReturnChain, IndexReturnSource, NavIndexReturns, StaticIndexReturns,
};
pub use memory_store::InMemoryStore;
