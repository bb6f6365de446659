use super::ui;
use crate::core::planner::PlanSnapshot;
use crate::report;
use anyhow::Result;
use std::path::Path;

/// Writes the workbook and lists the sheets it produced.
pub fn run(snapshot: &PlanSnapshot, output: &Path) -> Result<()> {
    let written = report::write_workbook(snapshot, output)?;

    println!(
        "\nWorkbook written to {}",
        ui::style_text(&output.display().to_string(), ui::StyleType::TotalValue)
    );
    for path in &written {
        if let Some(name) = path.file_name() {
            println!("  {}", name.to_string_lossy());
        }
    }

    Ok(())
}
