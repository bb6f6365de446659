use anyhow::{Context, Result};
use std::time::Duration;

const USER_AGENT: &str = "payplan/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by all requests of one provider. Bounded per-request
/// timeout, no retries.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Parses percentage strings such as "1.23%" into their numeric form.
pub fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}
