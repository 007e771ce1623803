mod price_point;
pub mod fund;
pub mod score;
pub mod bucket;
pub mod benchmark;
pub mod nav;

pub use price_point::{PricePoint, PriceSeries};
pub use fund::{FundCandidate, FundCategory, FundRecord, FundType, MetricSet, RiskCategory};
pub use score::{NormalizedMetrics, ScoreBreakdown, ScoredFund};
pub use bucket::{
    AllocationStrategy, Bucket, BucketOption, BucketSummary, CategorySummary, CategoryWeight,
    Diversification, FundAllocation, GenerateBucketsRequest, GenerateBucketsResponse, RiskLevel,
    StrategyInfo,
};
pub use benchmark::{
    BasketHolding, BenchmarkComparison, BenchmarkComponent, BenchmarkIndexEntry, BenchmarkIndices,
    BenchmarkReport, BlendedBenchmark, ChartPoint, CompareRequest, ComparisonSource, IndexReturns,
    OutperformanceSummary, Period,
};
pub use nav::{
    Cashflow, Holding, HoldingBenchmarkWeight, HoldingOutcome, HoldingReturn,
    HoldingsBenchmarkComparison, NavRecord, PortfolioReturns, PortfolioTotals, ReturnWindow,
    SchemePeriodReturns, WindowReturn,
};
