use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::core::config::{AllocationBucket, AppConfig, CoreLongTermTarget};
use crate::core::market::{self, MarketDataProvider, NewsArticle, ProviderKind, QuoteResult};

/// A single stock position. Tickers are stored uppercase and act as the
/// unique key within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub company: String,
    pub shares: f64,
    pub avg_cost: f64,
    pub category: String,
}

/// One planner run's worth of state: the holdings and allocation plan from
/// config plus the latest market data fetch. Owned by the caller and passed
/// explicitly to each operation.
pub struct PlannerSession {
    holdings: Vec<Holding>,
    buckets: Vec<AllocationBucket>,
    core_targets: Vec<CoreLongTermTarget>,
    contribution: f64,
    news_limit: usize,
    quotes: HashMap<String, QuoteResult>,
    news: HashMap<String, Vec<NewsArticle>>,
    data_source: Option<ProviderKind>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl PlannerSession {
    /// Builds a session from a validated config.
    pub fn from_config(config: &AppConfig) -> Self {
        let holdings = config
            .holdings
            .iter()
            .map(|h| Holding {
                ticker: h.ticker.to_uppercase(),
                company: h.company.clone(),
                shares: h.shares,
                avg_cost: h.avg_cost,
                category: h.category.clone(),
            })
            .collect();

        PlannerSession {
            holdings,
            buckets: config.buckets.clone(),
            core_targets: config.core_longterm.clone(),
            contribution: config.contribution,
            news_limit: config.news_per_ticker,
            quotes: HashMap::new(),
            news: HashMap::new(),
            data_source: None,
            refreshed_at: None,
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn buckets(&self) -> &[AllocationBucket] {
        &self.buckets
    }

    pub fn core_targets(&self) -> &[CoreLongTermTarget] {
        &self.core_targets
    }

    pub fn contribution(&self) -> f64 {
        self.contribution
    }

    pub fn news_limit(&self) -> usize {
        self.news_limit
    }

    pub fn quotes(&self) -> &HashMap<String, QuoteResult> {
        &self.quotes
    }

    pub fn news(&self) -> &HashMap<String, Vec<NewsArticle>> {
        &self.news
    }

    pub fn data_source(&self) -> Option<ProviderKind> {
        self.data_source
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    pub fn set_news_limit(&mut self, limit: usize) {
        self.news_limit = limit;
    }

    /// Replaces the bi-weekly contribution amount. Non-positive amounts are
    /// rejected and the previous value is retained.
    pub fn set_contribution(&mut self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0 {
            bail!("Contribution must be positive, got {amount}");
        }
        self.contribution = amount;
        Ok(())
    }

    /// Adds a new position. The ticker must not already be present.
    pub fn add_holding(&mut self, holding: Holding) -> Result<()> {
        let ticker = holding.ticker.to_uppercase();
        if holding.shares < 0.0 || holding.avg_cost < 0.0 {
            bail!("Shares and average cost must be non-negative for {ticker}");
        }
        if self.holdings.iter().any(|h| h.ticker == ticker) {
            bail!("Ticker {ticker} already exists");
        }
        self.holdings.push(Holding { ticker, ..holding });
        Ok(())
    }

    /// Updates the share count, average cost and (optionally) category of an
    /// existing position.
    pub fn update_holding(
        &mut self,
        ticker: &str,
        shares: f64,
        avg_cost: f64,
        category: Option<&str>,
    ) -> Result<()> {
        let ticker = ticker.to_uppercase();
        if shares < 0.0 || avg_cost < 0.0 {
            bail!("Shares and average cost must be non-negative for {ticker}");
        }
        let Some(holding) = self.holdings.iter_mut().find(|h| h.ticker == ticker) else {
            bail!("Ticker {ticker} not found");
        };
        holding.shares = shares;
        holding.avg_cost = avg_cost;
        if let Some(category) = category {
            holding.category = category.to_string();
        }
        Ok(())
    }

    /// Replaces the session's quotes and news wholesale with a fresh fetch.
    /// Per-ticker failures degrade to placeholders inside the fetch helpers,
    /// so this never fails as a whole.
    pub async fn refresh_market_data(
        &mut self,
        provider: &dyn MarketDataProvider,
        on_ticker: &(dyn Fn() + Sync),
    ) {
        let tickers = self.tickers();
        self.quotes = market::fetch_quotes(provider, &tickers, on_ticker).await;
        self.news = market::fetch_news(provider, &tickers, self.news_limit, on_ticker).await;
        self.data_source = Some(provider.kind());
        self.refreshed_at = Some(Utc::now());
    }
}
