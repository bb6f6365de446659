//! Valuation and allocation engine. Pure projections over the session's
//! holdings, buckets and latest quotes.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::config::{AllocationBucket, CoreLongTermTarget};
use crate::core::market::{NewsArticle, ProviderKind, QuoteResult};
use crate::core::portfolio::{Holding, PlannerSession};

/// How many holdings the dashboard highlights as top performers.
pub const TOP_PERFORMER_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingView {
    pub ticker: String,
    pub company: String,
    pub shares: f64,
    pub avg_cost: f64,
    pub category: String,
    pub current_price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
    pub quote_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioTotals {
    pub market_value: f64,
    pub cost_basis: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketAllocation {
    pub bucket: String,
    pub percentage: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedBuy {
    pub bucket: String,
    pub ticker: String,
    pub price: f64,
    pub dollar_allocation: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    pub ticker: String,
    pub quote: QuoteResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRow {
    pub ticker: String,
    pub article: NewsArticle,
}

/// Read-only projection of a session, shared by the interactive views and
/// the workbook export.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub holdings: Vec<HoldingView>,
    pub totals: PortfolioTotals,
    pub allocations: Vec<BucketAllocation>,
    pub suggested_buys: Vec<SuggestedBuy>,
    pub top_performers: Vec<HoldingView>,
    pub quotes: Vec<QuoteRow>,
    pub news: Vec<NewsRow>,
    pub buckets: Vec<AllocationBucket>,
    pub core_targets: Vec<CoreLongTermTarget>,
    pub contribution: f64,
    pub data_source: Option<ProviderKind>,
    pub generated_at: DateTime<Utc>,
}

/// Joins holdings with the latest quotes. A missing or unavailable quote
/// values the position at zero; a zero cost basis reports 0% gain.
pub fn build_holdings_view(
    holdings: &[Holding],
    quotes: &HashMap<String, QuoteResult>,
) -> Vec<HoldingView> {
    holdings
        .iter()
        .map(|holding| {
            let quote = quotes.get(&holding.ticker);
            let current_price = quote.map_or(0.0, QuoteResult::price);
            let market_value = holding.shares * current_price;
            let cost_basis = holding.shares * holding.avg_cost;
            let gain_loss = market_value - cost_basis;
            let gain_loss_pct = if cost_basis > 0.0 {
                (market_value / cost_basis - 1.0) * 100.0
            } else {
                0.0
            };

            HoldingView {
                ticker: holding.ticker.clone(),
                company: holding.company.clone(),
                shares: holding.shares,
                avg_cost: holding.avg_cost,
                category: holding.category.clone(),
                current_price,
                market_value,
                cost_basis,
                gain_loss,
                gain_loss_pct,
                quote_available: quote.is_some_and(|q| q.as_live().is_some()),
            }
        })
        .collect()
}

pub fn portfolio_totals(views: &[HoldingView]) -> PortfolioTotals {
    let market_value: f64 = views.iter().map(|v| v.market_value).sum();
    let cost_basis: f64 = views.iter().map(|v| v.cost_basis).sum();
    let gain_loss = market_value - cost_basis;
    let gain_loss_pct = if cost_basis > 0.0 {
        gain_loss / cost_basis * 100.0
    } else {
        0.0
    };

    PortfolioTotals {
        market_value,
        cost_basis,
        gain_loss,
        gain_loss_pct,
    }
}

/// Splits the contribution across buckets by their configured percentage.
pub fn bucket_allocations(contribution: f64, buckets: &[AllocationBucket]) -> Vec<BucketAllocation> {
    buckets
        .iter()
        .map(|bucket| BucketAllocation {
            bucket: bucket.name.clone(),
            percentage: bucket.percentage,
            amount: contribution * bucket.percentage / 100.0,
        })
        .collect()
}

/// Splits each bucket's dollar amount equally across its members. A ticker
/// without a usable price suggests zero shares; an empty bucket produces no
/// rows.
pub fn suggested_buys(
    contribution: f64,
    buckets: &[AllocationBucket],
    quotes: &HashMap<String, QuoteResult>,
) -> Vec<SuggestedBuy> {
    let mut buys = Vec::new();
    for bucket in buckets {
        if bucket.tickers.is_empty() {
            continue;
        }
        let bucket_amount = contribution * bucket.percentage / 100.0;
        let dollar_allocation = bucket_amount / bucket.tickers.len() as f64;

        for ticker in &bucket.tickers {
            let price = quotes.get(ticker).map_or(0.0, QuoteResult::price);
            let shares = if price > 0.0 {
                round4(dollar_allocation / price)
            } else {
                0.0
            };
            buys.push(SuggestedBuy {
                bucket: bucket.name.clone(),
                ticker: ticker.clone(),
                price,
                dollar_allocation,
                shares,
            });
        }
    }
    buys
}

/// The `n` best holdings by gain percentage, descending. The sort is stable
/// so equal percentages keep their input order.
pub fn top_performers(views: &[HoldingView], n: usize) -> Vec<HoldingView> {
    let mut ranked = views.to_vec();
    ranked.sort_by(|a, b| {
        b.gain_loss_pct
            .partial_cmp(&a.gain_loss_pct)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// Builds the full read model for one session.
pub fn snapshot(session: &PlannerSession) -> PlanSnapshot {
    let holdings = build_holdings_view(session.holdings(), session.quotes());
    let totals = portfolio_totals(&holdings);
    let allocations = bucket_allocations(session.contribution(), session.buckets());
    let buys = suggested_buys(session.contribution(), session.buckets(), session.quotes());
    let top = top_performers(&holdings, TOP_PERFORMER_COUNT);

    let quotes = session
        .holdings()
        .iter()
        .filter_map(|h| {
            session.quotes().get(&h.ticker).map(|quote| QuoteRow {
                ticker: h.ticker.clone(),
                quote: quote.clone(),
            })
        })
        .collect();

    let news = session
        .holdings()
        .iter()
        .flat_map(|h| {
            session
                .news()
                .get(&h.ticker)
                .into_iter()
                .flatten()
                .map(|article| NewsRow {
                    ticker: h.ticker.clone(),
                    article: article.clone(),
                })
        })
        .collect();

    PlanSnapshot {
        holdings,
        totals,
        allocations,
        suggested_buys: buys,
        top_performers: top,
        quotes,
        news,
        buckets: session.buckets().to_vec(),
        core_targets: session.core_targets().to_vec(),
        contribution: session.contribution(),
        data_source: session.data_source(),
        generated_at: Utc::now(),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
