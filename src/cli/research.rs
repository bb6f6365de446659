use super::ui;
use crate::core::planner::PlanSnapshot;
use anyhow::Result;
use comfy_table::Cell;

/// Renders the news digest, the quote snapshot and the bucket reference.
pub fn run(snapshot: &PlanSnapshot) -> Result<()> {
    print_news(snapshot);
    print_quotes(snapshot);
    print_buckets(snapshot);
    Ok(())
}

fn print_news(snapshot: &PlanSnapshot) {
    println!("\n{}\n", ui::style_text("News", ui::StyleType::Title));

    if snapshot.news.is_empty() {
        println!("{}", ui::style_text("No articles fetched.", ui::StyleType::Subtle));
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Headline"),
        ui::header_cell("Source"),
        ui::header_cell("Published"),
    ]);

    for row in &snapshot.news {
        let published = row
            .article
            .published_at
            .map_or("N/A".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string());
        table.add_row(vec![
            Cell::new(&row.ticker),
            Cell::new(&row.article.headline),
            Cell::new(&row.article.source),
            Cell::new(published),
        ]);
    }

    println!("{table}");
}

fn print_quotes(snapshot: &PlanSnapshot) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Price"),
        ui::header_cell("Change"),
        ui::header_cell("Change (%)"),
    ]);

    for row in &snapshot.quotes {
        match row.quote.as_live() {
            Some(quote) => {
                let change_cell = quote
                    .change_percent
                    .map_or_else(|| ui::na_cell(false), ui::change_cell);
                table.add_row(vec![
                    Cell::new(&row.ticker),
                    ui::num_cell(ui::money(quote.price)),
                    ui::num_cell(format!("{:+.2}", quote.change)),
                    change_cell,
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(&row.ticker),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                ]);
            }
        }
    }

    println!(
        "\n{}\n",
        ui::style_text("Current Prices", ui::StyleType::Title)
    );
    println!("{table}");
}

fn print_buckets(snapshot: &PlanSnapshot) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Bucket"),
        ui::header_cell("Tickers"),
        ui::header_cell("Allocation (%)"),
    ]);

    for bucket in &snapshot.buckets {
        table.add_row(vec![
            Cell::new(&bucket.name),
            Cell::new(bucket.tickers.join(", ")),
            ui::num_cell(format!("{:.1}", bucket.percentage)),
        ]);
    }

    println!(
        "\n{}\n",
        ui::style_text("Investment Buckets", ui::StyleType::Title)
    );
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::planner;
    use crate::core::portfolio::PlannerSession;

    #[test]
    fn test_research_renders_without_market_data() {
        let session = PlannerSession::from_config(&AppConfig::default());
        let snapshot = planner::snapshot(&session);

        assert!(run(&snapshot).is_ok());
    }
}
