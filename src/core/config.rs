use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::market::ProviderKind;

/// Tolerance for the bucket percentage sum check.
pub const ALLOCATION_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HoldingConfig {
    pub ticker: String,
    pub company: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub avg_cost: f64,
    pub category: String,
}

/// A named group of tickers receiving a fixed share of each contribution.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AllocationBucket {
    pub name: String,
    pub percentage: f64,
    pub tickers: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CoreLongTermTarget {
    pub ticker: String,
    pub target_percentage: f64,
    pub notes: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderEndpointConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub finnhub: Option<ProviderEndpointConfig>,
    pub polygon: Option<ProviderEndpointConfig>,
    pub alpha: Option<ProviderEndpointConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_contribution")]
    pub contribution: f64,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_news_per_ticker")]
    pub news_per_ticker: usize,
    #[serde(default = "default_holdings")]
    pub holdings: Vec<HoldingConfig>,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<AllocationBucket>,
    #[serde(default = "default_core_longterm")]
    pub core_longterm: Vec<CoreLongTermTarget>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            contribution: default_contribution(),
            provider: ProviderKind::default(),
            news_per_ticker: default_news_per_ticker(),
            holdings: default_holdings(),
            buckets: default_buckets(),
            core_longterm: default_core_longterm(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config file from the default location, falling back to the
    /// built-in portfolio when no file exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            debug!("No config file found, using built-in defaults");
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "payplan", "payplan")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Structural checks that must hold before any planning starts.
    pub fn validate(&self) -> Result<()> {
        let total: f64 = self.buckets.iter().map(|b| b.percentage).sum();
        if (total - 100.0).abs() > ALLOCATION_SUM_TOLERANCE {
            bail!("Allocation percentages must sum to 100%, got {total}%");
        }

        let mut seen = HashSet::new();
        for holding in &self.holdings {
            if !seen.insert(holding.ticker.to_uppercase()) {
                bail!("Duplicate ticker in holdings config: {}", holding.ticker);
            }
            if holding.shares < 0.0 {
                bail!("Holding {} has negative shares", holding.ticker);
            }
            if holding.avg_cost < 0.0 {
                bail!("Holding {} has negative average cost", holding.ticker);
            }
        }

        Ok(())
    }
}

fn default_contribution() -> f64 {
    1000.0
}

fn default_news_per_ticker() -> usize {
    3
}

fn holding(ticker: &str, company: &str, shares: f64, avg_cost: f64, category: &str) -> HoldingConfig {
    HoldingConfig {
        ticker: ticker.to_string(),
        company: company.to_string(),
        shares,
        avg_cost,
        category: category.to_string(),
    }
}

fn default_holdings() -> Vec<HoldingConfig> {
    vec![
        holding("NVDA", "NVIDIA Corporation", 1.03, 119.22, "Growth / AI"),
        holding("MSFT", "Microsoft Corporation", 0.20, 490.00, "Core / Tech Blue Chip"),
        holding("AMZN", "Amazon.com Inc.", 0.11, 193.00, "Growth / Consumer Tech"),
        holding("TSLA", "Tesla Inc.", 0.08, 164.00, "High Volatility / Growth"),
        holding("CRWD", "CrowdStrike Holdings Inc.", 0.14, 305.00, "Cybersecurity / Growth"),
        holding("GOOGL", "Alphabet Inc. Class A", 0.37, 199.00, "Core / Tech"),
        holding("AAPL", "Apple Inc.", 0.51, 223.00, "Core / Tech"),
        holding("PANW", "Palo Alto Networks Inc.", 0.29, 189.00, "Cybersecurity"),
        holding("AVGO", "Broadcom Inc.", 0.60, 244.00, "Dividend / Semi"),
        holding("UNH", "UnitedHealth Group Inc.", 0.0, 0.0, "Defensive / Healthcare"),
        holding("UPS", "United Parcel Service Inc.", 0.0, 0.0, "Dividend / Industrial"),
        holding("VST", "Vistra Corp.", 0.0, 0.0, "Utility / Energy"),
        holding("HIMS", "Hims & Hers Health Inc.", 0.0, 0.0, "Speculative / HealthTech"),
        holding("AB", "AllianceBernstein Holding L.P.", 0.44, 32.00, "Dividend / Asset Mgmt"),
        holding("ZYNE", "Zynerba Pharmaceuticals Inc.", 1.00, 1.25, "Speculative / Biotech"),
        holding("BULL", "Direxion Daily S&P 500 Bull 3X ETF", 3.46, 7.07, "Leveraged ETF"),
    ]
}

fn bucket(name: &str, percentage: f64, tickers: &[&str]) -> AllocationBucket {
    AllocationBucket {
        name: name.to_string(),
        percentage,
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
    }
}

fn default_buckets() -> Vec<AllocationBucket> {
    vec![
        bucket("Core / Tech", 25.0, &["AAPL", "MSFT", "GOOGL", "AVGO"]),
        bucket("Growth / AI", 30.0, &["NVDA", "AMZN", "TSLA", "CRWD", "PANW"]),
        bucket("Dividend / Defensive", 20.0, &["UNH", "UPS", "VST", "AB"]),
        bucket("Speculative / High Risk", 15.0, &["HIMS", "ZYNE", "BULL"]),
        bucket("Future Additions", 10.0, &["VTI", "VOO", "SCHD"]),
    ]
}

fn target(ticker: &str, target_percentage: f64, notes: &str) -> CoreLongTermTarget {
    CoreLongTermTarget {
        ticker: ticker.to_string(),
        target_percentage,
        notes: notes.to_string(),
    }
}

fn default_core_longterm() -> Vec<CoreLongTermTarget> {
    vec![
        target("NVDA", 15.0, "AI leader, long-term hold"),
        target("AAPL", 12.0, "Core portfolio anchor"),
        target("MSFT", 10.0, "Cloud + AI growth"),
        target("GOOGL", 8.0, "Advertising + AI"),
        target("AVGO", 8.0, "Dividend + chip exposure"),
        target("AMZN", 7.0, "Long-term e-commerce play"),
        target("CRWD", 6.0, "Strong momentum stock"),
        target("PANW", 5.0, "Security sector exposure"),
        target("TSLA", 4.0, "High risk, long-term"),
        target("UNH", 4.0, "Healthcare stability"),
        target("UPS", 3.0, "Dividend yield stock"),
        target("VST", 3.0, "Utility stability"),
        target("AB", 2.0, "Dividend reinvestment candidate"),
        target("HIMS", 2.0, "Small-cap growth potential"),
        target("ZYNE", 1.0, "High risk, small position"),
        target("BULL", 1.0, "High risk, consider replacing"),
    ]
}
