use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::util;
use crate::core::market::{MarketDataProvider, NewsArticle, ProviderKind, Quote};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// How far back the company news window reaches.
const NEWS_WINDOW_DAYS: i64 = 7;

#[derive(Debug)]
pub struct FinnhubProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl FinnhubProvider {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        Ok(FinnhubProvider {
            base_url: base_url.to_string(),
            api_key,
            client: util::build_http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubQuoteResponse {
    #[serde(rename = "c")]
    current: f64,
    #[serde(rename = "d")]
    change: Option<f64>,
    #[serde(rename = "dp")]
    change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    headline: Option<String>,
    source: Option<String>,
    datetime: Option<i64>,
    url: Option<String>,
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Finnhub
    }

    #[instrument(name = "FinnhubQuote", skip(self), fields(ticker = %ticker))]
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
        let url = format!("{}/quote", self.base_url);
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", ticker), ("token", self.api_key.as_str())])
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
            .json::<FinnhubQuoteResponse>()
            .await
            .with_context(|| format!("Failed to parse quote response for {ticker}"))?;

        Ok(Quote {
            price: data.current,
            change: data.change.unwrap_or(0.0),
            change_percent: data.change_percent,
            fetched_at: Utc::now(),
        })
    }

    #[instrument(name = "FinnhubNews", skip(self), fields(ticker = %ticker))]
    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(NEWS_WINDOW_DAYS);
        let url = format!("{}/company-news", self.base_url);
        debug!("Requesting news from {}", url);

        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", ticker),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
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

        let articles = response
            .json::<Vec<FinnhubArticle>>()
            .await
            .with_context(|| format!("Failed to parse news response for {ticker}"))?;

        Ok(articles
            .into_iter()
            .take(limit)
            .map(|article| NewsArticle {
                headline: article.headline.unwrap_or_else(|| "N/A".to_string()),
                source: article.source.unwrap_or_else(|| "N/A".to_string()),
                published_at: article
                    .datetime
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
                url: article.url.unwrap_or_else(|| "N/A".to_string()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> FinnhubProvider {
        FinnhubProvider::new(&server.uri(), "test-key".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("token", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"c": 175.5, "d": 1.2, "dp": 0.69}"#),
            )
            .mount(&mock_server)
            .await;

        let quote = provider(&mock_server).await.fetch_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, 175.5);
        assert_eq!(quote.change, 1.2);
        assert_eq!(quote.change_percent, Some(0.69));
    }

    #[tokio::test]
    async fn test_quote_with_null_change_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"c": 12.0, "d": null, "dp": null}"#),
            )
            .mount(&mock_server)
            .await;

        let quote = provider(&mock_server).await.fetch_quote("ZYNE").await.unwrap();

        assert_eq!(quote.price, 12.0);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, None);
    }

    #[tokio::test]
    async fn test_quote_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).await.fetch_quote("AAPL").await;

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for ticker: AAPL"
        );
    }

    #[tokio::test]
    async fn test_quote_malformed_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "rate limit"}"#))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).await.fetch_quote("AAPL").await;

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse quote response for AAPL")
        );
    }

    #[tokio::test]
    async fn test_news_fetch_maps_and_truncates() {
        let mock_server = MockServer::start().await;
        let body = r#"[
            {"headline": "Results beat estimates", "source": "Reuters", "datetime": 1705312800, "url": "https://example.com/1"},
            {"headline": "New product launch", "source": "Bloomberg", "datetime": 1705309200, "url": "https://example.com/2"},
            {"headline": "Analyst upgrade", "source": "CNBC", "datetime": 1705305600, "url": "https://example.com/3"}
        ]"#;
        Mock::given(method("GET"))
            .and(path("/company-news"))
            .and(query_param("symbol", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let news = provider(&mock_server)
            .await
            .fetch_news("AAPL", 2)
            .await
            .unwrap();

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].headline, "Results beat estimates");
        assert_eq!(news[0].source, "Reuters");
        assert_eq!(
            news[0].published_at.unwrap(),
            Utc.timestamp_opt(1705312800, 0).single().unwrap()
        );
        assert_eq!(news[0].url, "https://example.com/1");
    }

    #[tokio::test]
    async fn test_news_with_missing_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/company-news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{}]"#))
            .mount(&mock_server)
            .await;

        let news = provider(&mock_server)
            .await
            .fetch_news("AAPL", 3)
            .await
            .unwrap();

        assert_eq!(news.len(), 1);
        assert_eq!(news[0].headline, "N/A");
        assert_eq!(news[0].published_at, None);
    }
}
