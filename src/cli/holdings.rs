use super::ui;
use crate::core::planner::PlanSnapshot;
use anyhow::Result;
use comfy_table::Cell;

/// Renders the holdings detail table with a totals footer.
pub fn run(snapshot: &PlanSnapshot) -> Result<()> {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Company"),
        ui::header_cell("Shares"),
        ui::header_cell("Avg Cost"),
        ui::header_cell("Price"),
        ui::header_cell("Market Value"),
        ui::header_cell("Cost Basis"),
        ui::header_cell("Gain/Loss $"),
        ui::header_cell("Gain/Loss %"),
        ui::header_cell("Category"),
    ]);

    for view in &snapshot.holdings {
        let price_cell = if view.quote_available {
            ui::num_cell(ui::money(view.current_price))
        } else {
            ui::na_cell(true)
        };
        table.add_row(vec![
            Cell::new(&view.ticker),
            Cell::new(&view.company),
            ui::num_cell(format!("{:.4}", view.shares)),
            ui::num_cell(ui::money(view.avg_cost)),
            price_cell,
            ui::num_cell(ui::money(view.market_value)),
            ui::num_cell(ui::money(view.cost_basis)),
            ui::num_cell(ui::money(view.gain_loss)),
            ui::change_cell(view.gain_loss_pct),
            Cell::new(&view.category),
        ]);
    }

    println!("\n{}\n", ui::style_text("Holdings", ui::StyleType::Title));
    println!("{table}");

    let totals = &snapshot.totals;
    let total_style = if totals.gain_loss >= 0.0 {
        ui::StyleType::TotalValue
    } else {
        ui::StyleType::Error
    };
    println!(
        "\nTotal Market Value: {}  Cost Basis: {}  Gain/Loss: {} ({:.2}%)",
        ui::style_text(&ui::money(totals.market_value), ui::StyleType::TotalLabel),
        ui::money(totals.cost_basis),
        ui::style_text(&ui::money(totals.gain_loss), total_style),
        totals.gain_loss_pct
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::planner;
    use crate::core::portfolio::PlannerSession;

    #[test]
    fn test_holdings_renders_without_market_data() {
        let session = PlannerSession::from_config(&AppConfig::default());
        let snapshot = planner::snapshot(&session);

        assert!(run(&snapshot).is_ok());
    }
}
