use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::util;
use crate::core::market::{MarketDataProvider, NewsArticle, ProviderKind, Quote};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage publish stamps look like "20240115T103000".
const TIME_PUBLISHED_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug)]
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        Ok(AlphaVantageProvider {
            base_url: base_url.to_string(),
            api_key,
            client: util::build_http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

// Alpha Vantage keys carry their column numbers, e.g. "05. price".
#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSentimentResponse {
    feed: Option<Vec<AlphaArticle>>,
}

#[derive(Debug, Deserialize)]
struct AlphaArticle {
    title: Option<String>,
    source: Option<String>,
    time_published: Option<String>,
    url: Option<String>,
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alpha
    }

    #[instrument(name = "AlphaVantageQuote", skip(self), fields(ticker = %ticker))]
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
        let url = format!("{}/query", self.base_url);
        debug!("Requesting global quote from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for ticker: {}", e, ticker))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for ticker: {}",
                response.status(),
                ticker
            ));
        }

        let data = response
            .json::<GlobalQuoteResponse>()
            .await
            .with_context(|| format!("Failed to parse quote response for {ticker}"))?;

        let quote = data
            .global_quote
            .ok_or_else(|| anyhow!("No quote data for ticker: {}", ticker))?;

        let price = quote
            .price
            .as_deref()
            .unwrap_or("0")
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid price field for {ticker}"))?;
        let change = quote
            .change
            .as_deref()
            .unwrap_or("0")
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid change field for {ticker}"))?;
        let change_percent = quote
            .change_percent
            .as_deref()
            .and_then(util::parse_percent);

        Ok(Quote {
            price,
            change,
            change_percent,
            fetched_at: Utc::now(),
        })
    }

    #[instrument(name = "AlphaVantageNews", skip(self), fields(ticker = %ticker))]
    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/query", self.base_url);
        debug!("Requesting news sentiment from {}", url);

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", ticker),
                ("limit", limit_param.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for ticker: {}", e, ticker))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for ticker: {}",
                response.status(),
                ticker
            ));
        }

        let data = response
            .json::<NewsSentimentResponse>()
            .await
            .with_context(|| format!("Failed to parse news response for {ticker}"))?;

        Ok(data
            .feed
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|article| NewsArticle {
                headline: article.title.unwrap_or_else(|| "N/A".to_string()),
                source: article.source.unwrap_or_else(|| "N/A".to_string()),
                published_at: article.time_published.as_deref().and_then(|raw| {
                    NaiveDateTime::parse_from_str(raw, TIME_PUBLISHED_FORMAT)
                        .ok()
                        .map(|dt| dt.and_utc())
                }),
                url: article.url.unwrap_or_else(|| "N/A".to_string()),
            })
            .collect())
    }
}
