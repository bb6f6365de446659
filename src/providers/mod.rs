pub mod alpha_vantage;
pub mod finnhub;
pub mod polygon;
pub mod util;

use anyhow::{Result, anyhow};

use crate::core::config::{ProviderEndpointConfig, ProvidersConfig};
use crate::core::market::{MarketDataProvider, ProviderKind};

/// Builds the selected provider. The base URL falls back to the live
/// endpoint when no config block is present; the API key comes from the
/// config block or the provider's environment variable. A missing key is
/// fatal, but only for the provider actually selected.
pub fn build_provider(
    kind: ProviderKind,
    config: &ProvidersConfig,
) -> Result<Box<dyn MarketDataProvider>> {
    match kind {
        ProviderKind::Finnhub => {
            let (base_url, api_key) = endpoint(
                config.finnhub.as_ref(),
                finnhub::DEFAULT_BASE_URL,
                "FINNHUB_API_KEY",
            )?;
            Ok(Box::new(finnhub::FinnhubProvider::new(&base_url, api_key)?))
        }
        ProviderKind::Polygon => {
            let (base_url, api_key) = endpoint(
                config.polygon.as_ref(),
                polygon::DEFAULT_BASE_URL,
                "POLYGON_API_KEY",
            )?;
            Ok(Box::new(polygon::PolygonProvider::new(&base_url, api_key)?))
        }
        ProviderKind::Alpha => {
            let (base_url, api_key) = endpoint(
                config.alpha.as_ref(),
                alpha_vantage::DEFAULT_BASE_URL,
                "ALPHA_VANTAGE_API_KEY",
            )?;
            Ok(Box::new(alpha_vantage::AlphaVantageProvider::new(
                &base_url, api_key,
            )?))
        }
    }
}

fn endpoint(
    config: Option<&ProviderEndpointConfig>,
    default_base_url: &str,
    key_var: &str,
) -> Result<(String, String)> {
    let base_url = config
        .map_or(default_base_url, |c| c.base_url.as_str())
        .to_string();
    let api_key = config
        .and_then(|c| c.api_key.clone())
        .or_else(|| std::env::var(key_var).ok())
        .ok_or_else(|| anyhow!("{key_var} is not set; it is required for the selected provider"))?;
    Ok((base_url, api_key))
}
