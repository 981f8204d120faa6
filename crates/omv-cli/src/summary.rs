use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::{MergeResult, VerifyResult};

pub fn print_verify_summary(result: &VerifyResult) {
    println!(
        "Source: {} ({})",
        result.source,
        result.source.display_name()
    );
    println!("Lookups issued: {}", result.lookups);
    if let Some(path) = &result.output {
        println!("Report: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Total"),
        header_cell("Found"),
        header_cell("Missing"),
        header_cell("Not checked"),
        header_cell("Found %"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=5 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for (kind, bucket) in result.statistics.kinds() {
        if bucket.total == 0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(kind.label()),
            Cell::new(bucket.total),
            count_cell(bucket.found, Color::Green),
            count_cell(bucket.missing, Color::Red),
            count_cell(bucket.not_checked, Color::Yellow),
            Cell::new(format!("{}%", bucket.found_percentage())),
        ]);
    }
    let summary = result.statistics.summary();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.total).add_attribute(Attribute::Bold),
        count_cell(summary.found, Color::Green).add_attribute(Attribute::Bold),
        count_cell(summary.missing, Color::Red).add_attribute(Attribute::Bold),
        count_cell(summary.not_checked, Color::Yellow).add_attribute(Attribute::Bold),
        Cell::new(format!("{}%", summary.found_percentage())).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if summary.not_checked > 0 {
        eprintln!(
            "Warning: {} entities were never checked; re-run the same pass to retry them.",
            summary.not_checked
        );
    }
    if !result.failures.is_empty() {
        eprintln!("Failed lookups (counted as missing):");
        for failure in &result.failures {
            eprintln!(
                "- {} {} in {}: {}",
                failure.kind, failure.external_id, failure.source, failure.message
            );
        }
    }
}

pub fn print_merge_summary(result: &MergeResult) {
    let sources: Vec<_> = result.merged.per_source_stats.keys().cloned().collect();
    println!("Merged records: {}", result.merged.merged_entities.len());
    if let Some(path) = &result.output {
        println!("Merged report: {}", path.display());
    }

    let mut coverage = Table::new();
    coverage.set_header(vec![
        header_cell("Source"),
        header_cell("Report entries"),
        header_cell("Counted"),
        header_cell("Not covered"),
    ]);
    apply_table_style(&mut coverage);
    for column in 1..=3 {
        align_column(&mut coverage, column, CellAlignment::Right);
    }
    for (source, stats) in &result.merged.per_source_stats {
        coverage.add_row(vec![
            Cell::new(source.display_name()),
            Cell::new(stats.total_forms),
            count_cell(stats.forms_counted, Color::Green),
            count_cell(stats.missing_external_ids, Color::Red),
        ]);
    }
    println!("{coverage}");

    let mut matrix = Table::new();
    let mut header = vec![header_cell("External ID"), header_cell("Form")];
    header.extend(sources.iter().map(|source| header_cell(source.as_str())));
    matrix.set_header(header);
    apply_table_style(&mut matrix);
    for record in &result.merged.merged_entities {
        let mut row = vec![
            Cell::new(record.external_id.as_str()),
            Cell::new(record.form_name.as_str()),
        ];
        for source in &sources {
            let cell = match record.statuses.get(source) {
                Some(&status) => status_cell(result.policy.display(status)),
                None => dim_cell("-"),
            };
            row.push(cell);
        }
        matrix.add_row(row);
    }
    println!("{matrix}");
}

fn status_cell(display: &str) -> Cell {
    match display {
        "Found" => Cell::new(display).fg(Color::Green),
        "Missing" => Cell::new(display).fg(Color::Red),
        _ => Cell::new(display).fg(Color::Yellow),
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn dim_cell(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).add_attribute(Attribute::Dim)
}

fn count_cell(value: usize, color: Color) -> Cell {
    if value > 0 {
        Cell::new(value).fg(color)
    } else {
        dim_cell(value)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
