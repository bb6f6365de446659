use super::ui;
use crate::core::planner::PlanSnapshot;
use anyhow::Result;
use comfy_table::Cell;

/// Renders the dashboard: portfolio summary, bucket split, suggested buys
/// and top performers.
pub fn run(snapshot: &PlanSnapshot) -> Result<()> {
    println!(
        "\n{}\n",
        ui::style_text("Bi-Weekly Investment Plan", ui::StyleType::Title)
    );
    println!(
        "Contribution: {}",
        ui::style_text(&ui::money(snapshot.contribution), ui::StyleType::TotalLabel)
    );
    if let Some(provider) = snapshot.data_source {
        println!(
            "Data source:  {}",
            ui::style_text(provider.display_name(), ui::StyleType::Subtle)
        );
    }

    print_summary(snapshot);
    print_allocation(snapshot);
    print_suggested_buys(snapshot);
    print_top_performers(snapshot);

    Ok(())
}

fn print_summary(snapshot: &PlanSnapshot) {
    let totals = &snapshot.totals;
    let gain_style = if totals.gain_loss >= 0.0 {
        ui::StyleType::TotalValue
    } else {
        ui::StyleType::Error
    };

    println!(
        "\n{}",
        ui::style_text("Portfolio Summary", ui::StyleType::Title)
    );
    println!("Total Market Value: {}", ui::money(totals.market_value));
    println!("Total Cost Basis:   {}", ui::money(totals.cost_basis));
    println!(
        "Total Gain/Loss:    {} ({:.2}%)",
        ui::style_text(&ui::money(totals.gain_loss), gain_style),
        totals.gain_loss_pct
    );
}

fn print_allocation(snapshot: &PlanSnapshot) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Bucket"),
        ui::header_cell("Allocation (%)"),
        ui::header_cell("Bi-Weekly $"),
    ]);

    for allocation in &snapshot.allocations {
        table.add_row(vec![
            Cell::new(&allocation.bucket),
            ui::num_cell(format!("{:.1}", allocation.percentage)),
            ui::num_cell(ui::money(allocation.amount)),
        ]);
    }

    println!("\n{}", ui::style_text("Allocation", ui::StyleType::Title));
    println!("{table}");
}

fn print_suggested_buys(snapshot: &PlanSnapshot) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Bucket"),
        ui::header_cell("Ticker"),
        ui::header_cell("Price"),
        ui::header_cell("$ Allocation"),
        ui::header_cell("Shares"),
    ]);

    for buy in &snapshot.suggested_buys {
        let price_cell = if buy.price > 0.0 {
            ui::num_cell(ui::money(buy.price))
        } else {
            ui::na_cell(true)
        };
        table.add_row(vec![
            Cell::new(&buy.bucket),
            Cell::new(&buy.ticker),
            price_cell,
            ui::num_cell(ui::money(buy.dollar_allocation)),
            ui::num_cell(format!("{:.4}", buy.shares)),
        ]);
    }

    println!(
        "\n{}",
        ui::style_text("Suggested Buys", ui::StyleType::Title)
    );
    println!("{table}");
}

fn print_top_performers(snapshot: &PlanSnapshot) {
    // Flat positions report 0% and are skipped here
    let performers: Vec<_> = snapshot
        .top_performers
        .iter()
        .filter(|view| view.gain_loss_pct != 0.0)
        .collect();
    if performers.is_empty() {
        return;
    }

    println!(
        "\n{}",
        ui::style_text("Top Performers", ui::StyleType::Title)
    );
    for view in performers {
        let pct = format!("{:+.2}%", view.gain_loss_pct);
        let style = if view.gain_loss_pct >= 0.0 {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        println!("{:<8} {}", view.ticker, ui::style_text(&pct, style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::planner;
    use crate::core::portfolio::PlannerSession;

    #[test]
    fn test_plan_renders_without_market_data() {
        let session = PlannerSession::from_config(&AppConfig::default());
        let snapshot = planner::snapshot(&session);

        assert!(run(&snapshot).is_ok());
    }
}
