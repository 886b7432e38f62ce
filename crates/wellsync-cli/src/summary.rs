use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use wellsync_cli::pipeline::CheckSummary;
use wellsync_core::{SkipReason, UpdateReport};
use wellsync_model::MatchClass;

use crate::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Business unit: {}", result.business_unit);
    println!("Output: {}", result.output_dir.display());
    println!(
        "Working rows: {}  In planning only: {}  In ledger only: {}",
        result.working_rows, result.planning_orphans, result.ledger_orphans
    );
    if !result.qc {
        print_check_table(&result.checks, false);
    }
    if let Some(updates) = &result.updates {
        println!();
        println!("Updates:");
        print_update_table(updates);
    }
    if let Some(post) = &result.post_update {
        println!();
        println!("After update:");
        print_check_table(post, true);
    } else if result.qc {
        print_check_table(&result.checks, true);
    }
    if let Some(path) = &result.script_path {
        println!("SQL script: {}", path.display());
    }
    if let Some(script) = &result.script {
        println!();
        println!("{script}");
    }
}

fn print_check_table(checks: &[CheckSummary], highlight_pending: bool) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Ledger column"),
        header_cell("Rows"),
        header_cell("Match"),
        header_cell("Mismatch"),
        header_cell("Ledger empty"),
        header_cell("Planning empty"),
        header_cell("Both empty"),
        header_cell("Pending"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total_rows = 0usize;
    let mut total_pending = 0usize;
    for check in checks {
        total_rows += check.rows;
        total_pending += check.pending;
        let name = if highlight_pending && check.needs_update() {
            Cell::new(&check.name)
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        } else if check.target.is_none() {
            dim_cell(&check.name)
        } else {
            Cell::new(&check.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            name,
            Cell::new(&check.ledger),
            Cell::new(check.rows),
            count_cell(check.count(MatchClass::Match), Color::Green),
            count_cell(check.count(MatchClass::Mismatch), Color::Yellow),
            count_cell(check.count(MatchClass::LedgerMissing), Color::Yellow),
            count_cell(check.count(MatchClass::PlanningMissing), Color::Magenta),
            dim_cell(check.count(MatchClass::BothMissing)),
            pending_cell(check),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(total_pending, Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_update_table(report: &UpdateReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Table"),
        header_cell("Column"),
        header_cell("Staged"),
        header_cell("Pending"),
        header_cell("Written"),
    ]);
    apply_table_style(&mut table);
    for index in 3..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for applied in &report.applied {
        let written = match applied.outcome.rows_affected {
            Some(rows) => count_cell(rows, Color::Green),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&applied.check)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(applied.target),
            Cell::new(&applied.column),
            Cell::new(applied.outcome.staged_rows),
            Cell::new(applied.outcome.pending),
            written,
        ]);
    }
    for (check, reason) in &report.skipped {
        let reason = match reason {
            SkipReason::ReportOnly => "report only",
            SkipReason::UpToDate => "up to date",
        };
        table.add_row(vec![
            dim_cell(check),
            dim_cell(reason),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    println!("{table}");
}

fn pending_cell(check: &CheckSummary) -> Cell {
    if check.target.is_none() {
        dim_cell(check.pending)
    } else {
        count_cell(check.pending, Color::Red)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
