use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crf_cli::replay::ReplayOutcome;
use crf_model::{ConfigurationReport, IssueSeverity};
use crf_visibility::VisibilityChange;

pub fn print_check_report(report: &ConfigurationReport) {
    println!("Form: {}", report.form_id);
    if report.issues.is_empty() {
        println!("No configuration issues.");
        return;
    }
    let mut issues: Vec<_> = report.issues.iter().collect();
    issues.sort_by_key(|issue| (severity_rank(issue.severity), issue.code.clone()));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Layout"),
        header_cell("Cell"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            optional_cell(issue.layout.as_deref()),
            optional_cell(issue.cell.as_deref()),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
    println!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}

pub fn print_replay(outcome: &ReplayOutcome) {
    println!("Form: {}", outcome.form);
    if outcome.closed {
        println!("View closed by the script; later steps were dropped.");
    }

    let mut steps = Table::new();
    steps.set_header(vec![
        header_cell("#"),
        header_cell("Step"),
        header_cell("Changes"),
        header_cell("Evaluations"),
        header_cell("Stale"),
    ]);
    apply_table_style(&mut steps);
    align_column(&mut steps, 0, CellAlignment::Right);
    align_column(&mut steps, 3, CellAlignment::Right);
    align_column(&mut steps, 4, CellAlignment::Right);
    for (index, step) in outcome.steps.iter().enumerate() {
        let changes = step
            .changes
            .iter()
            .map(describe_change)
            .collect::<Vec<_>>()
            .join("\n");
        steps.add_row(vec![
            Cell::new(index),
            Cell::new(&step.label),
            if changes.is_empty() { dim_cell("-") } else { Cell::new(changes) },
            Cell::new(step.evaluations),
            count_cell(step.stale, Color::Yellow),
        ]);
    }
    println!("{steps}");

    if !outcome.layouts.is_empty() {
        let mut layouts = Table::new();
        layouts.set_header(vec![header_cell("Layout"), header_cell("Visibility")]);
        apply_summary_table_style(&mut layouts);
        for layout in &outcome.layouts {
            layouts.add_row(vec![Cell::new(&layout.layout_id), visibility_cell(layout.shown)]);
        }
        println!("{layouts}");
    }

    let mut cells = Table::new();
    cells.set_header(vec![
        header_cell("Instance"),
        header_cell("Cell"),
        header_cell("Visibility"),
        header_cell("Field"),
        header_cell("Value"),
        header_cell("Disabled"),
    ]);
    apply_summary_table_style(&mut cells);
    align_column(&mut cells, 2, CellAlignment::Center);
    align_column(&mut cells, 5, CellAlignment::Center);
    for cell in &outcome.cells {
        cells.add_row(vec![
            Cell::new(&cell.layout_uid),
            Cell::new(&cell.cell_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            visibility_cell(cell.shown),
            optional_cell(cell.field_model_id.as_ref().map(|id| id.as_str())),
            optional_cell(cell.value.as_deref()),
            if cell.disabled { Cell::new("yes").fg(Color::Yellow) } else { dim_cell("no") },
        ]);
    }
    println!("{cells}");

    let plan = &outcome.submission;
    println!(
        "Submission: {} updated, {} created, {} removed, {} restored, {} field(s) reset",
        plan.updated.len(),
        plan.created.len(),
        plan.removed.len(),
        plan.restored.len(),
        plan.reset_count()
    );
}

fn describe_change(change: &VisibilityChange) -> String {
    match change {
        VisibilityChange::Cell {
            cell_id,
            layout_uid,
            shown,
        } => format!("{} {cell_id} in {layout_uid}", verb(*shown)),
        VisibilityChange::Layout { layout_id, shown } => {
            format!("{} layout {layout_id}", verb(*shown))
        }
    }
}

fn verb(shown: bool) -> &'static str {
    if shown { "show" } else { "hide" }
}

fn apply_table_style(table: &mut Table) {
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
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 0,
        IssueSeverity::Warning => 1,
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn visibility_cell(shown: bool) -> Cell {
    if shown {
        Cell::new("shown").fg(Color::Green)
    } else {
        Cell::new("hidden")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
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
