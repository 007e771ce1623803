pub mod allocation_service;
pub mod benchmark_service;
pub mod bucket_service;
pub mod historical_returns_service;
pub mod portfolio_returns_service;
pub mod returns;
pub mod returns_cache;
pub mod risk_metrics;
pub mod scoring_service;
