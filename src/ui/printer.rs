use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::core::models::StageStatus;
use crate::core::report::RunReport;

/// End-of-run table printed to the console in every outcome, including fatal
/// ones and cancellation.
pub fn print_summary(report: &RunReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Tool").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Elapsed").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);

    for record in &report.records {
        table.add_row(vec![
            Cell::new(record.stage),
            Cell::new(&record.tool),
            status_cell(record.status),
            Cell::new(format_elapsed(record.elapsed)),
            Cell::new(record.detail.as_deref().unwrap_or("")),
        ]);
    }

    let (completed, skipped, failed, cancelled) = report.counts();
    let title = if report.partial {
        format!("scan of {} (partial)", report.target).yellow().bold()
    } else {
        format!("scan of {}", report.target).bold()
    };

    println!();
    println!(
        "{} started {}",
        title,
        report.started.format("%Y-%m-%d %H:%M:%S")
    );
    println!("{table}");
    println!(
        "{} completed, {} skipped, {} failed, {} cancelled in {}",
        completed.to_string().green(),
        skipped.to_string().yellow(),
        failed.to_string().red(),
        cancelled,
        format_elapsed(report.total_elapsed)
    );
    if report.partial {
        println!("{}", "results are partial: the scan was stopped early".yellow());
    }
}

fn status_cell(status: StageStatus) -> Cell {
    match status {
        StageStatus::Completed => Cell::new("completed").fg(Color::Green),
        StageStatus::Skipped => Cell::new("skipped").fg(Color::Yellow),
        StageStatus::Failed => Cell::new("failed").fg(Color::Red),
        StageStatus::Cancelled => Cell::new("cancelled").fg(Color::DarkGrey),
    }
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 60.0 {
        format!("{}m{:02}s", (secs / 60.0) as u64, (secs % 60.0) as u64)
    } else {
        format!("{:.1}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_formats_both_ranges() {
        assert_eq!(format_elapsed(Duration::from_millis(2_300)), "2.3s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m05s");
    }
}
