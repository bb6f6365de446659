use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::planner::PlanSnapshot;

/// Sheet files making up one workbook, in write order.
pub const SHEET_FILES: [&str; 5] = [
    "dashboard.csv",
    "portfolio.csv",
    "allocation.csv",
    "research.csv",
    "strategy.csv",
];

/// Writes the five-sheet workbook into `dir`, creating it if needed.
/// Numeric cells are written at full precision so exported totals reproduce
/// the sums of their rows exactly.
pub fn write_workbook(snapshot: &PlanSnapshot, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create workbook directory: {}", dir.display()))?;

    let written = vec![
        write_dashboard_sheet(snapshot, dir)?,
        write_portfolio_sheet(snapshot, dir)?,
        write_allocation_sheet(snapshot, dir)?,
        write_research_sheet(snapshot, dir)?,
        write_strategy_sheet(snapshot, dir)?,
    ];

    info!("Workbook written to {}", dir.display());
    Ok(written)
}

fn sheet_writer(dir: &Path, file: &str) -> Result<(csv::Writer<fs::File>, PathBuf)> {
    let path = dir.join(file);
    let writer = WriterBuilder::new()
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to create sheet: {}", path.display()))?;
    Ok((writer, path))
}

fn num(value: f64) -> String {
    value.to_string()
}

fn write_dashboard_sheet(snapshot: &PlanSnapshot, dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = sheet_writer(dir, SHEET_FILES[0])?;

    writer.write_record(["Portfolio Summary"])?;
    writer.write_record(["Total Market Value".to_string(), num(snapshot.totals.market_value)])?;
    writer.write_record(["Total Cost Basis".to_string(), num(snapshot.totals.cost_basis)])?;
    writer.write_record(["Total Gain/Loss".to_string(), num(snapshot.totals.gain_loss)])?;
    writer.write_record(["Total Return %".to_string(), num(snapshot.totals.gain_loss_pct)])?;
    writer.write_record([""])?;

    writer.write_record(["Bi-Weekly Investment Plan"])?;
    writer.write_record(["Contribution Amount".to_string(), num(snapshot.contribution)])?;
    for allocation in &snapshot.allocations {
        writer.write_record([
            allocation.bucket.clone(),
            num(allocation.amount),
            format!("{}%", allocation.percentage),
        ])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Top Performers"])?;
    for view in &snapshot.top_performers {
        if view.gain_loss_pct != 0.0 {
            writer.write_record([
                view.ticker.clone(),
                format!("{:.2}%", view.gain_loss_pct),
            ])?;
        }
    }
    writer.write_record([""])?;

    writer.write_record(["Data Source Information"])?;
    let provider = snapshot
        .data_source
        .map_or("N/A", |kind| kind.display_name());
    writer.write_record(["Provider", provider])?;
    writer.write_record([
        "Last Updated".to_string(),
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ])?;
    writer.write_record(["Quotes Fetched".to_string(), snapshot.quotes.len().to_string()])?;
    writer.write_record(["News Articles".to_string(), snapshot.news.len().to_string()])?;

    writer.flush()?;
    Ok(path)
}

fn write_portfolio_sheet(snapshot: &PlanSnapshot, dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = sheet_writer(dir, SHEET_FILES[1])?;

    writer.write_record([
        "Ticker",
        "Company Name",
        "Shares",
        "Avg Cost",
        "Current Price",
        "Market Value",
        "Cost Basis",
        "Gain/Loss $",
        "Gain/Loss %",
        "Category",
    ])?;

    for view in &snapshot.holdings {
        writer.write_record([
            view.ticker.clone(),
            view.company.clone(),
            num(view.shares),
            num(view.avg_cost),
            num(view.current_price),
            num(view.market_value),
            num(view.cost_basis),
            num(view.gain_loss),
            num(view.gain_loss_pct),
            view.category.clone(),
        ])?;
    }

    writer.write_record([
        "TOTALS".to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        num(snapshot.totals.market_value),
        num(snapshot.totals.cost_basis),
        num(snapshot.totals.gain_loss),
        num(snapshot.totals.gain_loss_pct),
        String::new(),
    ])?;

    writer.flush()?;
    Ok(path)
}

fn write_allocation_sheet(snapshot: &PlanSnapshot, dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = sheet_writer(dir, SHEET_FILES[2])?;

    writer.write_record(["Bucket", "Allocation %", "Bi-Weekly $"])?;
    for allocation in &snapshot.allocations {
        writer.write_record([
            allocation.bucket.clone(),
            num(allocation.percentage),
            num(allocation.amount),
        ])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Suggested Buys"])?;
    writer.write_record(["Bucket", "Ticker", "Price", "$ Allocation", "Shares"])?;
    for buy in &snapshot.suggested_buys {
        writer.write_record([
            buy.bucket.clone(),
            buy.ticker.clone(),
            num(buy.price),
            num(buy.dollar_allocation),
            num(buy.shares),
        ])?;
    }
    writer.write_record([""])?;

    // Cross-check row: percentages must sum to 100, dollars to the
    // contribution amount.
    let pct_sum: f64 = snapshot.allocations.iter().map(|a| a.percentage).sum();
    let dollar_sum: f64 = snapshot.allocations.iter().map(|a| a.amount).sum();
    writer.write_record(["Total Allocation Check".to_string(), num(pct_sum), num(dollar_sum)])?;

    writer.flush()?;
    Ok(path)
}

fn write_research_sheet(snapshot: &PlanSnapshot, dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = sheet_writer(dir, SHEET_FILES[3])?;

    writer.write_record(["Ticker", "Headline", "Source", "Published", "URL"])?;
    for row in &snapshot.news {
        let published = row
            .article
            .published_at
            .map_or("N/A".to_string(), |dt| dt.to_rfc3339());
        writer.write_record([
            row.ticker.clone(),
            row.article.headline.clone(),
            row.article.source.clone(),
            published,
            row.article.url.clone(),
        ])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Current Prices"])?;
    writer.write_record(["Ticker", "Price", "Change", "Change %"])?;
    for row in &snapshot.quotes {
        match row.quote.as_live() {
            Some(quote) => {
                let change_percent = quote
                    .change_percent
                    .map_or("N/A".to_string(), |pct| format!("{pct:.2}%"));
                writer.write_record([
                    row.ticker.clone(),
                    num(quote.price),
                    num(quote.change),
                    change_percent,
                ])?;
            }
            None => {
                writer.write_record([
                    row.ticker.clone(),
                    "N/A".to_string(),
                    "N/A".to_string(),
                    "N/A".to_string(),
                ])?;
            }
        }
    }
    writer.write_record([""])?;

    writer.write_record(["Investment Buckets"])?;
    for bucket in &snapshot.buckets {
        writer.write_record([
            bucket.name.clone(),
            bucket.tickers.join(", "),
            format!("{}%", bucket.percentage),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

fn write_strategy_sheet(snapshot: &PlanSnapshot, dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = sheet_writer(dir, SHEET_FILES[4])?;

    writer.write_record(["Ticker/Fund", "Target % in Core", "Notes"])?;
    for target in &snapshot.core_targets {
        writer.write_record([
            target.ticker.clone(),
            num(target.target_percentage),
            target.notes.clone(),
        ])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Allocation Strategy"])?;
    writer.write_record(["This sheet outlines the long-term core holdings strategy."])?;
    writer.write_record(["Target percentages should be maintained over time through"])?;
    writer.write_record(["regular rebalancing and strategic additions."])?;

    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::market::{MarketDataProvider, NewsArticle, ProviderKind, Quote};
    use crate::core::planner;
    use crate::core::portfolio::PlannerSession;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct TableProvider {
        prices: HashMap<&'static str, f64>,
    }

    #[async_trait]
    impl MarketDataProvider for TableProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Finnhub
        }

        async fn fetch_quote(&self, ticker: &str) -> anyhow::Result<Quote> {
            self.prices
                .get(ticker)
                .map(|price| Quote {
                    price: *price,
                    change: 1.0,
                    change_percent: Some(0.5),
                    fetched_at: Utc::now(),
                })
                .ok_or_else(|| anyhow!("no quote for {}", ticker))
        }

        async fn fetch_news(&self, ticker: &str, _limit: usize) -> anyhow::Result<Vec<NewsArticle>> {
            Ok(vec![NewsArticle {
                headline: format!("{ticker} in the news"),
                source: "Newswire".to_string(),
                published_at: None,
                url: format!("https://example.com/{ticker}"),
            }])
        }
    }

    async fn snapshot() -> planner::PlanSnapshot {
        let yaml = r#"
contribution: 1000.0
holdings:
  - ticker: "AAPL"
    company: "Apple Inc."
    shares: 10.0
    avg_cost: 150.0
    category: "Core / Tech"
  - ticker: "MSFT"
    company: "Microsoft Corporation"
    shares: 5.0
    avg_cost: 350.0
    category: "Core / Tech"
  - ticker: "UNH"
    company: "UnitedHealth Group Inc."
    shares: 0.0
    avg_cost: 0.0
    category: "Defensive / Healthcare"
buckets:
  - name: "Core"
    percentage: 60.0
    tickers: ["AAPL", "MSFT"]
  - name: "Defensive"
    percentage: 40.0
    tickers: ["UNH"]
core_longterm:
  - ticker: "AAPL"
    target_percentage: 100.0
    notes: "Anchor position"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        let mut session = PlannerSession::from_config(&config);
        let provider = TableProvider {
            prices: HashMap::from([("AAPL", 175.0), ("MSFT", 380.0)]),
        };
        session.refresh_market_data(&provider, &|| {}).await;
        planner::snapshot(&session)
    }

    #[tokio::test]
    async fn test_workbook_writes_all_five_sheets() {
        let snapshot = snapshot().await;
        let dir = tempfile::tempdir().unwrap();

        let written = write_workbook(&snapshot, dir.path()).unwrap();

        assert_eq!(written.len(), 5);
        for file in SHEET_FILES {
            assert!(dir.path().join(file).exists(), "missing sheet {file}");
        }
    }

    #[tokio::test]
    async fn test_portfolio_totals_round_trip() {
        let snapshot = snapshot().await;
        let dir = tempfile::tempdir().unwrap();
        write_workbook(&snapshot, dir.path()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(dir.path().join("portfolio.csv"))
            .unwrap();

        let mut market_value_sum = 0.0;
        let mut cost_basis_sum = 0.0;
        let mut totals_row: Option<(f64, f64, f64)> = None;
        for record in reader.records() {
            let record = record.unwrap();
            if &record[0] == "TOTALS" {
                totals_row = Some((
                    record[5].parse().unwrap(),
                    record[6].parse().unwrap(),
                    record[7].parse().unwrap(),
                ));
            } else {
                market_value_sum += record[5].parse::<f64>().unwrap();
                cost_basis_sum += record[6].parse::<f64>().unwrap();
            }
        }

        let (total_mv, total_cb, total_gl) = totals_row.expect("TOTALS row missing");
        assert!((total_mv - market_value_sum).abs() < 1e-6);
        assert!((total_cb - cost_basis_sum).abs() < 1e-6);
        assert!((total_gl - (market_value_sum - cost_basis_sum)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_allocation_check_row_sums_to_contribution() {
        let snapshot = snapshot().await;
        let dir = tempfile::tempdir().unwrap();
        write_workbook(&snapshot, dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("allocation.csv")).unwrap();
        let check_line = content
            .lines()
            .find(|line| line.starts_with("Total Allocation Check"))
            .expect("check row missing");
        let fields: Vec<&str> = check_line.split(',').collect();

        assert_eq!(fields[1].parse::<f64>().unwrap(), 100.0);
        assert_eq!(fields[2].parse::<f64>().unwrap(), 1000.0);
    }

    #[tokio::test]
    async fn test_research_sheet_marks_unavailable_quotes() {
        let snapshot = snapshot().await;
        let dir = tempfile::tempdir().unwrap();
        write_workbook(&snapshot, dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("research.csv")).unwrap();
        // UNH has no quote in the provider table
        assert!(content.contains("UNH,N/A,N/A,N/A"));
        assert!(content.contains("AAPL in the news"));
    }
}
