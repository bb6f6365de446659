//! Market data abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

/// The external market data services a planner session can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Finnhub,
    Polygon,
    Alpha,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Finnhub => "Finnhub",
            ProviderKind::Polygon => "Polygon",
            ProviderKind::Alpha => "Alpha Vantage",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderKind::Finnhub => "finnhub",
                ProviderKind::Polygon => "polygon",
                ProviderKind::Alpha => "alpha",
            }
        )
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finnhub" => Ok(ProviderKind::Finnhub),
            "polygon" => Ok(ProviderKind::Polygon),
            "alpha" | "alphavantage" | "alpha-vantage" => Ok(ProviderKind::Alpha),
            _ => Err(anyhow::anyhow!("Unsupported provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
    pub change_percent: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

/// A per-ticker fetch outcome. `Unavailable` marks a ticker whose quote
/// could not be obtained this cycle, as opposed to a legitimately
/// zero-priced `Live` quote.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteResult {
    Live(Quote),
    Unavailable,
}

impl QuoteResult {
    /// Price used by downstream arithmetic. Unavailable tickers value at 0.
    pub fn price(&self) -> f64 {
        match self {
            QuoteResult::Live(quote) => quote.price,
            QuoteResult::Unavailable => 0.0,
        }
    }

    pub fn as_live(&self) -> Option<&Quote> {
        match self {
            QuoteResult::Live(quote) => Some(quote),
            QuoteResult::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsArticle {
    pub headline: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ProviderKind;
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote>;
    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>>;
}

/// Fetches quotes one ticker at a time. A failed request degrades that
/// ticker to `Unavailable`; the rest of the batch is unaffected.
pub async fn fetch_quotes(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    on_ticker: &(dyn Fn() + Sync),
) -> HashMap<String, QuoteResult> {
    let mut quotes = HashMap::new();
    for ticker in tickers {
        let result = match provider.fetch_quote(ticker).await {
            Ok(quote) => QuoteResult::Live(quote),
            Err(e) => {
                warn!(%ticker, provider = %provider.kind(), "Quote fetch failed: {e:#}");
                QuoteResult::Unavailable
            }
        };
        quotes.insert(ticker.clone(), result);
        on_ticker();
    }
    quotes
}

/// Fetches news one ticker at a time; a failure degrades that ticker to an
/// empty article list.
pub async fn fetch_news(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    limit: usize,
    on_ticker: &(dyn Fn() + Sync),
) -> HashMap<String, Vec<NewsArticle>> {
    let mut news = HashMap::new();
    for ticker in tickers {
        let articles = match provider.fetch_news(ticker, limit).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(%ticker, provider = %provider.kind(), "News fetch failed: {e:#}");
                Vec::new()
            }
        };
        news.insert(ticker.clone(), articles);
        on_ticker();
    }
    news
}
