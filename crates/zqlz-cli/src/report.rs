//! Terminal rendering of optimization results

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use zqlz_optimizer::OptimizationResult;

/// Renders every suggestion list of `result` as text tables
pub fn render_tables(result: &OptimizationResult) -> String {
    let mut sections = vec![result.summary().to_string()];

    if !result.index_suggestions().is_empty() {
        let mut table = new_table(&["Priority", "Kind", "Table", "Columns", "Selectivity", "DDL"]);
        for suggestion in result.index_suggestions() {
            table.add_row(vec![
                suggestion.priority().to_string(),
                suggestion.kind().as_str().to_string(),
                suggestion.table().to_string(),
                suggestion.columns().join(", "),
                format!("{:.3}", suggestion.estimated_selectivity()),
                suggestion.to_create_index_sql(),
            ]);
        }
        sections.push(format!("Index suggestions\n{table}"));
    }

    if !result.pushdown_suggestions().is_empty() {
        let mut table = new_table(&["Priority", "Kind", "Predicate", "Move", "Target", "Reason"]);
        for suggestion in result.pushdown_suggestions() {
            table.add_row(vec![
                suggestion.priority().to_string(),
                suggestion.kind().description().to_string(),
                suggestion.predicate().to_string(),
                format!(
                    "{} -> {}",
                    suggestion.original_position(),
                    suggestion.suggested_position()
                ),
                suggestion.target_table().unwrap_or("-").to_string(),
                suggestion.reason().to_string(),
            ]);
        }
        sections.push(format!("Predicate suggestions\n{table}"));
    }

    if !result.join_suggestions().is_empty() {
        let mut table = new_table(&["Kind", "Original", "Suggested", "Improvement", "Reason"]);
        for suggestion in result.join_suggestions() {
            table.add_row(vec![
                suggestion.kind().description().to_string(),
                suggestion.original_sequence().join(" > "),
                suggestion.suggested_sequence().join(" > "),
                format!("{:.1}%", suggestion.estimated_improvement() * 100.0),
                suggestion.reason().to_string(),
            ]);
        }
        sections.push(format!("Join order suggestions\n{table}"));
    }

    for note in result.degraded() {
        sections.push(format!("warning: {} advisor degraded: {}", note.advisor, note.reason));
    }

    sections.join("\n\n")
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}
