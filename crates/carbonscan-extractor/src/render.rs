//! Serialization of spans into the text sent to the reasoning service
//!
//! Every span starts with a marker line naming its page so the service can
//! cite locations:
//!
//! ```text
//! === TABLE 2 ON PAGE 14 ===
//! HEADER: Metric | 2023 | 2022
//! SCOPE: Scope 1 | 12,345 | 13,001
//! DATA: Stationary combustion | 9,100 | 9,800
//! TOTAL: Total Scope 1 and 2 | 16,545 | 17,801
//!
//! === TEXT ON PAGE 15 (lines 3-18) ===
//! ...
//! ```

use crate::rules::RuleSet;
use carbonscan_domain::Table;

const CELL_SEPARATOR: &str = " | ";

/// Marker line for a table (ordinal and page are 1-based)
pub fn table_marker(ordinal: usize, page_index: usize) -> String {
    format!("=== TABLE {} ON PAGE {} ===", ordinal, page_index)
}

/// Marker line for text lines `start..end` (0-based, end exclusive)
pub fn text_marker(page_index: usize, start: usize, end: usize) -> String {
    format!(
        "=== TEXT ON PAGE {} (lines {}-{}) ===",
        page_index,
        start + 1,
        end.max(start + 1)
    )
}

/// Serialize a table with row labels
///
/// The first row is always the header. A row naming a scope is labelled
/// `SCOPE`; rows after it are `DATA`, or `TOTAL` when they carry a total.
pub fn render_table(table: &Table, ordinal: usize, page_index: usize, rules: &RuleSet) -> String {
    let mut lines = vec![table_marker(ordinal, page_index)];

    if let Some(header) = table.header() {
        lines.push(format!("HEADER: {}", join_cells(header)));
    }

    for row in table.rows.iter().skip(1) {
        let text = join_cells(row);
        if text.is_empty() {
            continue;
        }

        let label = if row.iter().any(|cell| rules.mentions_scope(cell)) {
            "SCOPE"
        } else if is_total(&text) {
            "TOTAL"
        } else {
            "DATA"
        };
        lines.push(format!("{}: {}", label, text));
    }

    lines.join("\n")
}

/// Serialize text lines starting at line `start`; blank lines are dropped
pub fn render_text(page_index: usize, start: usize, lines: &[&str]) -> String {
    let mut out = text_marker(page_index, start, start + lines.len());
    for line in lines {
        let line = line.trim_end();
        if !line.trim().is_empty() {
            out.push('\n');
            out.push_str(line);
        }
    }
    out
}

fn join_cells(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(CELL_SEPARATOR)
}

fn is_total(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("total") || lower.contains("subtotal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_table_rows_are_labelled() {
        let rules = RuleSet::from_config(&ClassifierConfig::default()).unwrap();
        let table = table(&[
            &["Metric", "2023", "2022"],
            &["Scope 1", "12,345", "13,001"],
            &["Stationary combustion", "9,100", ""],
            &["", "", ""],
            &["Total Scope 1 and 2", "16,545", "17,801"],
            &["Total energy", "5,000", "4,900"],
        ]);

        let rendered = render_table(&table, 2, 14, &rules);
        assert_eq!(
            rendered,
            "=== TABLE 2 ON PAGE 14 ===\n\
             HEADER: Metric | 2023 | 2022\n\
             SCOPE: Scope 1 | 12,345 | 13,001\n\
             DATA: Stationary combustion | 9,100\n\
             SCOPE: Total Scope 1 and 2 | 16,545 | 17,801\n\
             TOTAL: Total energy | 5,000 | 4,900"
        );
    }

    #[test]
    fn test_empty_header_is_kept() {
        let rules = RuleSet::from_config(&ClassifierConfig::default()).unwrap();
        let rendered = render_table(&table(&[&["", ""], &["Scope 2", "800"]]), 1, 1, &rules);
        assert!(rendered.contains("\nHEADER: \n"));
    }

    #[test]
    fn test_text_marker_is_one_based_and_inclusive() {
        assert_eq!(text_marker(15, 2, 18), "=== TEXT ON PAGE 15 (lines 3-18) ===");
        assert_eq!(
            render_text(3, 0, &["Scope 1: 500  ", "", "done"]),
            "=== TEXT ON PAGE 3 (lines 1-3) ===\nScope 1: 500\ndone"
        );
    }
}
