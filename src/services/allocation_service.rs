use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::models::{
    AllocationStrategy, Bucket, BucketSummary, CategorySummary, CategoryWeight, Diversification,
    FundAllocation, FundCategory, RiskLevel, ScoredFund,
};

// Differences at or below these are treated as ties by the ranking.
const SCORE_TOLERANCE: f64 = 0.1;
const SORTINO_TOLERANCE: f64 = 0.1;
const SD_TOLERANCE: f64 = 0.01;

fn weights(table: &[(FundCategory, f64)]) -> Vec<CategoryWeight> {
    table
        .iter()
        .map(|(category, weight)| CategoryWeight {
            category: *category,
            weight: *weight,
        })
        .collect()
}

/// The fixed category mix of a risk level. Weights sum to 1.
pub fn strategy(risk_level: RiskLevel) -> AllocationStrategy {
    use FundCategory::*;

    let (name, description, tag, table): (&str, &str, &str, &[(FundCategory, f64)]) = match risk_level {
        RiskLevel::Low => (
            "Conservative Portfolio",
            "Focus on capital preservation with steady returns",
            "Safe & Stable",
            &[(Debt, 0.40), (Liquid, 0.25), (Balanced, 0.20), (LargeCap, 0.10), (Index, 0.05)],
        ),
        RiskLevel::Medium => (
            "Balanced Portfolio",
            "Mix of growth and stability for moderate returns",
            "Balanced Growth",
            &[
                (LargeCap, 0.25),
                (FlexiCap, 0.20),
                (Balanced, 0.20),
                (MidCap, 0.15),
                (Debt, 0.10),
                (Index, 0.05),
                (Elss, 0.05),
            ],
        ),
        RiskLevel::High => (
            "Aggressive Portfolio",
            "Maximum growth potential with higher volatility",
            "High Growth",
            &[
                (MidCap, 0.25),
                (SmallCap, 0.20),
                (LargeCap, 0.20),
                (FlexiCap, 0.15),
                (Elss, 0.10),
                (Balanced, 0.05),
                (Index, 0.05),
            ],
        ),
    };

    AllocationStrategy {
        risk_level,
        name: name.to_string(),
        description: description.to_string(),
        tag: tag.to_string(),
        weights: weights(table),
    }
}

/// Ranking order of two funds of the same category.
///
/// Score descending, then Sortino descending, then volatility ascending,
/// each step ignoring differences within its tolerance; expense ratio
/// ascending settles the rest.
pub fn compare_candidates(a: &ScoredFund, b: &ScoredFund) -> Ordering {
    let (sa, sb) = (a.final_score(), b.final_score());
    if (sb - sa).abs() > SCORE_TOLERANCE {
        return sb.total_cmp(&sa);
    }

    let (ma, mb) = (&a.metrics, &b.metrics);
    if (mb.sortino_ratio - ma.sortino_ratio).abs() > SORTINO_TOLERANCE {
        return mb.sortino_ratio.total_cmp(&ma.sortino_ratio);
    }
    if (ma.standard_deviation - mb.standard_deviation).abs() > SD_TOLERANCE {
        return ma.standard_deviation.total_cmp(&mb.standard_deviation);
    }
    ma.expense_ratio.total_cmp(&mb.expense_ratio)
}

/// Rank the funds of one category and keep the best `top_n`.
///
/// Tolerance ties are not transitive, so this is a stable insertion sort
/// over the comparator rather than `sort_by`, with the symbol as the last
/// resort so equal funds always come out in the same order.
pub fn rank_candidates<'a>(funds: &[&'a ScoredFund], top_n: usize) -> Vec<&'a ScoredFund> {
    let mut ordered: Vec<&ScoredFund> = funds.to_vec();
    ordered.sort_by(|a, b| a.candidate.symbol.cmp(&b.candidate.symbol));

    for i in 1..ordered.len() {
        let mut j = i;
        while j > 0 && compare_candidates(ordered[j - 1], ordered[j]) == Ordering::Greater {
            ordered.swap(j - 1, j);
            j -= 1;
        }
    }

    ordered.truncate(top_n);
    ordered
}

/// Build one bucket for a strategy from the scored universe.
///
/// A category's weight is split evenly over the funds selected for it; a
/// category with no funds leaves its weight undeployed.
///
/// # Arguments
/// * `scored` - the scored fund universe
/// * `strategy` - category weights to fill
/// * `amount` - capital to allocate
/// * `duration` - holding period in years for the projection
/// * `funds_per_category` - how many top-ranked funds each category takes
pub fn build_bucket(
    scored: &[ScoredFund],
    strategy: &AllocationStrategy,
    amount: f64,
    duration: u32,
    funds_per_category: usize,
) -> Bucket {
    let mut funds: Vec<FundAllocation> = Vec::new();
    let mut weighted_return = 0.0;
    let mut weighted_risk = 0.0;
    let mut deployed_weight = 0.0;

    for target in &strategy.weights {
        let in_category: Vec<&ScoredFund> = scored
            .iter()
            .filter(|f| f.candidate.category == target.category)
            .collect();
        let selected = rank_candidates(&in_category, funds_per_category);

        if selected.is_empty() {
            debug!(
                "No funds for {} in {}, {:.0}% left undeployed",
                target.category,
                strategy.name,
                target.weight * 100.0
            );
            continue;
        }

        let per_fund_weight = target.weight / selected.len() as f64;
        for fund in selected {
            let expected_return = fund.candidate.derived_return;
            let allocation = amount * per_fund_weight;
            let projected_value = allocation * (1.0 + expected_return).powf(duration as f64);

            weighted_return += expected_return * per_fund_weight;
            weighted_risk += fund.metrics.standard_deviation * per_fund_weight;
            deployed_weight += per_fund_weight;

            funds.push(FundAllocation {
                symbol: fund.candidate.symbol.clone(),
                name: fund.candidate.name.clone(),
                category: fund.candidate.category,
                risk_category: fund.candidate.risk_category,
                scheme_code: fund.candidate.scheme_code.clone(),
                allocation,
                percentage: per_fund_weight * 100.0,
                expected_return,
                projected_value,
                projected_gain: projected_value - allocation,
                final_score: fund.final_score(),
                metrics: fund.metrics,
                score_breakdown: fund.score_breakdown,
            });
        }
    }

    let total_investment: f64 = funds.iter().map(|f| f.allocation).sum();
    let total_projected_value: f64 = funds.iter().map(|f| f.projected_value).sum();
    let overall_return = if deployed_weight > 0.0 {
        weighted_return / deployed_weight
    } else {
        0.0
    };

    let category_summary = summarize_categories(&funds);
    let diversification = Diversification {
        fund_count: funds.len(),
        category_count: category_summary.len(),
    };

    info!(
        "Built {} bucket: {} funds, {:.2} of {:.2} deployed",
        strategy.risk_level,
        funds.len(),
        total_investment,
        amount
    );

    Bucket {
        strategy: strategy.info(),
        summary: BucketSummary {
            total_investment,
            total_projected_value,
            total_gain: total_projected_value - total_investment,
            overall_return,
            annualized_return: overall_return * 100.0,
            risk_score: weighted_risk * 100.0,
            duration,
        },
        funds,
        category_summary,
        diversification,
    }
}

/// Per-category totals, in the order categories first appear in the bucket.
pub fn summarize_categories(funds: &[FundAllocation]) -> Vec<CategorySummary> {
    let mut order: Vec<FundCategory> = Vec::new();
    let mut by_category: BTreeMap<FundCategory, CategorySummary> = BTreeMap::new();

    for fund in funds {
        let entry = by_category.entry(fund.category).or_insert_with(|| {
            order.push(fund.category);
            CategorySummary {
                category: fund.category,
                total_allocation: 0.0,
                total_percentage: 0.0,
                funds: Vec::new(),
            }
        });
        entry.total_allocation += fund.allocation;
        entry.total_percentage += fund.percentage;
        entry.funds.push(fund.symbol.clone());
    }

    order
        .into_iter()
        .filter_map(|c| by_category.remove(&c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FundCandidate, MetricSet, NormalizedMetrics, PriceSeries, RiskCategory, ScoreBreakdown,
    };

    fn scored(symbol: &str, category: FundCategory, score: f64, ret: f64) -> ScoredFund {
        let metrics = MetricSet {
            standard_deviation: 0.1,
            expense_ratio: 1.0,
            ..MetricSet::default()
        };
        let normalized = NormalizedMetrics {
            sharpe: 0.5,
            sortino: 0.5,
            treynor: 0.5,
            alpha: 0.5,
            info_ratio: 0.5,
            sd: 0.5,
            beta: 0.5,
            expense: 0.5,
            turnover: 0.5,
        };
        ScoredFund {
            candidate: FundCandidate {
                symbol: symbol.to_string(),
                name: format!("{} Fund", symbol),
                category,
                risk_category: RiskCategory::Medium,
                scheme_code: None,
                price_series: PriceSeries::default(),
                derived_return: ret,
                metrics,
            },
            metrics,
            score_breakdown: ScoreBreakdown {
                final_score: score,
                risk_adjusted_score: 0.0,
                stability_score: 0.0,
                manager_skill_score: 0.0,
                cost_efficiency_score: 0.0,
                normalized,
            },
        }
    }

    fn universe() -> Vec<ScoredFund> {
        FundCategory::ALL
            .iter()
            .flat_map(|c| {
                (0..3).map(move |i| {
                    scored(&format!("{}_{}", c, i), *c, 10.0 + i as f64 * 5.0, 0.08 + i as f64 * 0.01)
                })
            })
            .collect()
    }

    #[test]
    fn test_strategy_weights_sum_to_one() {
        for level in RiskLevel::ALL {
            let s = strategy(level);
            assert!((s.total_weight() - 1.0).abs() < 1e-9, "{} sums to {}", level, s.total_weight());
        }
    }

    #[test]
    fn test_strategy_metadata() {
        let low = strategy(RiskLevel::Low);
        assert_eq!(low.name, "Conservative Portfolio");
        assert_eq!(low.tag, "Safe & Stable");
        assert_eq!(low.weight_of(FundCategory::Debt), 0.40);
        assert_eq!(low.weight_of(FundCategory::SmallCap), 0.0);
    }

    #[test]
    fn test_ranking_by_score_then_tie_breakers() {
        let mut a = scored("A", FundCategory::MidCap, 50.0, 0.1);
        let mut b = scored("B", FundCategory::MidCap, 50.05, 0.1);
        let c = scored("C", FundCategory::MidCap, 60.0, 0.1);
        // A and B tie on score; A wins on Sortino
        a.metrics.sortino_ratio = 1.5;
        b.metrics.sortino_ratio = 1.0;

        let ranked = rank_candidates(&[&a, &b, &c], 3);
        let symbols: Vec<&str> = ranked.iter().map(|f| f.candidate.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_ranking_falls_through_to_expense() {
        let mut a = scored("A", FundCategory::Debt, 40.0, 0.07);
        let mut b = scored("B", FundCategory::Debt, 40.0, 0.07);
        a.metrics.expense_ratio = 0.9;
        b.metrics.expense_ratio = 0.4;

        let ranked = rank_candidates(&[&a, &b], 1);
        assert_eq!(ranked[0].candidate.symbol, "B");
    }

    #[test]
    fn test_bucket_category_percentages_respect_weights() {
        let scored = universe();
        for level in RiskLevel::ALL {
            let s = strategy(level);
            let bucket = build_bucket(&scored, &s, 100_000.0, 3, 2);

            for summary in &bucket.category_summary {
                let cap = s.weight_of(summary.category) * 100.0;
                assert!((summary.total_percentage - cap).abs() < 1e-9);
                assert_eq!(summary.funds.len(), 2);
            }
            assert!((bucket.summary.total_investment - 100_000.0).abs() < 1e-6);
            assert_eq!(bucket.diversification.category_count, s.weights.len());
        }
    }

    #[test]
    fn test_bucket_picks_top_two_and_projects() {
        let scored = universe();
        let bucket = build_bucket(&scored, &strategy(RiskLevel::Low), 100_000.0, 3, 2);

        let debt: Vec<&FundAllocation> = bucket
            .funds
            .iter()
            .filter(|f| f.category == FundCategory::Debt)
            .collect();
        assert_eq!(debt.len(), 2);
        assert_eq!(debt[0].symbol, "debt_2");
        assert_eq!(debt[1].symbol, "debt_1");
        assert!((debt[0].allocation - 20_000.0).abs() < 1e-9);
        assert!((debt[0].projected_value - 20_000.0 * 1.10f64.powi(3)).abs() < 1e-6);
        assert!(bucket.summary.total_projected_value >= bucket.summary.total_investment);
    }

    #[test]
    fn test_empty_category_leaves_weight_undeployed() {
        let scored: Vec<ScoredFund> = universe()
            .into_iter()
            .filter(|f| f.candidate.category != FundCategory::Liquid)
            .collect();
        let bucket = build_bucket(&scored, &strategy(RiskLevel::Low), 100_000.0, 1, 2);

        assert!((bucket.summary.total_investment - 75_000.0).abs() < 1e-6);
        assert!(bucket
            .category_summary
            .iter()
            .all(|c| c.category != FundCategory::Liquid));
    }

    #[test]
    fn test_overall_return_is_weighted_average() {
        let scored = vec![
            scored("D1", FundCategory::Debt, 10.0, 0.06),
            scored("L1", FundCategory::Liquid, 10.0, 0.04),
        ];
        let bucket = build_bucket(&scored, &strategy(RiskLevel::Low), 1_000.0, 1, 2);

        // debt 0.40 at 6%, liquid 0.25 at 4%
        let expected = (0.40 * 0.06 + 0.25 * 0.04) / 0.65;
        assert!((bucket.summary.overall_return - expected).abs() < 1e-12);
        assert!((bucket.summary.annualized_return - expected * 100.0).abs() < 1e-9);
    }
}
