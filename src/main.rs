use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use payplan::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Bi-weekly contribution amount in dollars
    #[arg(long, global = true)]
    contribution: Option<f64>,

    /// Market data provider: finnhub, polygon or alpha
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Number of news articles to fetch per ticker
    #[arg(long, global = true)]
    news_per_ticker: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for payplan::AppCommand {
    fn from(cmd: Commands) -> payplan::AppCommand {
        match cmd {
            Commands::Plan => payplan::AppCommand::Plan,
            Commands::Holdings => payplan::AppCommand::Holdings,
            Commands::Research => payplan::AppCommand::Research,
            Commands::Export { output } => payplan::AppCommand::Export { output },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the bi-weekly plan dashboard
    Plan,
    /// Display current holdings with live valuations
    Holdings,
    /// Display news and quote snapshot for the portfolio
    Research,
    /// Export the plan to a multi-sheet workbook
    Export {
        /// Directory the workbook sheets are written to
        #[arg(short, long, default_value = "InvestmentPlan")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = payplan::PlanOptions {
        contribution: cli.contribution,
        provider: cli.provider,
        news_per_ticker: cli.news_per_ticker,
    };

    let result = match cli.command {
        Some(Commands::Setup) => payplan::cli::setup::setup(),
        Some(cmd) => payplan::run_command(cmd.into(), cli.config_path.as_deref(), options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
