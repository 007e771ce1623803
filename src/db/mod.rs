pub mod fund_queries;
pub mod nav_queries;
mod pg_store;

pub use pg_store::PgStore;
