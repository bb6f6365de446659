pub mod cli;
pub mod core;
pub mod providers;
pub mod report;

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::market::ProviderKind;
use crate::core::planner;
use crate::core::portfolio::PlannerSession;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Plan,
    Holdings,
    Research,
    Export { output: PathBuf },
}

/// Plan-affecting values the CLI may override on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub contribution: Option<f64>,
    pub provider: Option<String>,
    pub news_per_ticker: Option<usize>,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    options: PlanOptions,
) -> Result<()> {
    info!("Contribution planner starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let mut session = PlannerSession::from_config(&config);
    if let Some(amount) = options.contribution {
        session.set_contribution(amount)?;
    }
    if let Some(limit) = options.news_per_ticker {
        session.set_news_limit(limit);
    }

    let kind = match &options.provider {
        Some(name) => name.parse::<ProviderKind>()?,
        None => config.provider,
    };
    let provider = providers::build_provider(kind, &config.providers)?;

    // Two passes per ticker: one for the quote, one for news
    let pb = ui::new_progress_bar((session.holdings().len() * 2) as u64, true);
    pb.set_message("Fetching market data...");
    session
        .refresh_market_data(provider.as_ref(), &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    let snapshot = planner::snapshot(&session);
    match command {
        AppCommand::Plan => cli::plan::run(&snapshot),
        AppCommand::Holdings => cli::holdings::run(&snapshot),
        AppCommand::Research => cli::research::run(&snapshot),
        AppCommand::Export { output } => cli::export::run(&snapshot, &output),
    }
}
