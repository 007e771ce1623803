use std::str::FromStr;

use tracing::warn;

/// Engine knobs; everything here has a sensible default.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Annual risk-free rate used by every ratio (e.g., 0.06 for 6%)
    pub risk_free_rate: f64,
    /// How many top-ranked funds are taken per strategy category
    pub funds_per_category: usize,
    /// Clamp each fund's CAGR into its category's expected-return band
    pub clamp_expected_returns: bool,
    pub benchmark_cache_ttl_hours: i64,
    /// Symbol whose price history serves as the market series for beta/alpha/IR
    pub market_proxy_symbol: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.06,
            funds_per_category: 2,
            clamp_expected_returns: false,
            benchmark_cache_ttl_hours: 24,
            market_proxy_symbol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();

        let engine = EngineConfig {
            risk_free_rate: env_or("RISK_FREE_RATE", defaults.risk_free_rate),
            funds_per_category: env_or("FUNDS_PER_CATEGORY", defaults.funds_per_category),
            clamp_expected_returns: env_or("CLAMP_EXPECTED_RETURNS", defaults.clamp_expected_returns),
            benchmark_cache_ttl_hours: env_or(
                "BENCHMARK_CACHE_TTL_HOURS",
                defaults.benchmark_cache_ttl_hours,
            ),
            market_proxy_symbol: std::env::var("MARKET_PROXY_SYMBOL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            engine,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid value '{}' for {}, using default {:?}", raw, key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.risk_free_rate, 0.06);
        assert_eq!(cfg.funds_per_category, 2);
        assert_eq!(cfg.benchmark_cache_ttl_hours, 24);
        assert!(!cfg.clamp_expected_returns);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("RISK_FREE_RATE", "abc", 0.06), 0.06);
        assert_eq!(parse_or("RISK_FREE_RATE", " 0.05 ", 0.06), 0.05);
        assert!(parse_or("CLAMP_EXPECTED_RETURNS", "true", false));
    }
}
