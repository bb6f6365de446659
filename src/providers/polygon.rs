use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::util;
use crate::core::market::{MarketDataProvider, NewsArticle, ProviderKind, Quote};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

#[derive(Debug)]
pub struct PolygonProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PolygonProvider {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        Ok(PolygonProvider {
            base_url: base_url.to_string(),
            api_key,
            client: util::build_http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PolygonSnapshotResponse {
    results: Option<PolygonSnapshot>,
}

#[derive(Debug, Deserialize)]
struct PolygonSnapshot {
    value: Option<f64>,
    change: Option<f64>,
    change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PolygonNewsResponse {
    results: Option<Vec<PolygonArticle>>,
}

#[derive(Debug, Deserialize)]
struct PolygonArticle {
    title: Option<String>,
    publisher: Option<PolygonPublisher>,
    published_utc: Option<String>,
    article_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolygonPublisher {
    name: Option<String>,
}

#[async_trait]
impl MarketDataProvider for PolygonProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Polygon
    }

    #[instrument(name = "PolygonQuote", skip(self), fields(ticker = %ticker))]
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
        let url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
            self.base_url, ticker
        );
        debug!("Requesting snapshot from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
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

        let text = response.text().await?;
        let data: PolygonSnapshotResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot response for {ticker}"))?;

        let snapshot = data
            .results
            .ok_or_else(|| anyhow!("No snapshot data for ticker: {}", ticker))?;

        Ok(Quote {
            price: snapshot.value.unwrap_or(0.0),
            change: snapshot.change.unwrap_or(0.0),
            change_percent: snapshot.change_percent,
            fetched_at: Utc::now(),
        })
    }

    #[instrument(name = "PolygonNews", skip(self), fields(ticker = %ticker))]
    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let url = format!("{}/v2/reference/news", self.base_url);
        debug!("Requesting news from {}", url);

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ticker", ticker),
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
            .json::<PolygonNewsResponse>()
            .await
            .with_context(|| format!("Failed to parse news response for {ticker}"))?;

        Ok(data
            .results
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|article| NewsArticle {
                headline: article.title.unwrap_or_else(|| "N/A".to_string()),
                source: article
                    .publisher
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| "N/A".to_string()),
                published_at: article.published_utc.as_deref().and_then(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }),
                url: article.article_url.unwrap_or_else(|| "N/A".to_string()),
            })
            .collect())
    }
}
