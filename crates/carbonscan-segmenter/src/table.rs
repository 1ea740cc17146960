//! Text-layout table detection
//!
//! PDF text layers carry no table markup, but tables survive extraction as
//! runs of lines whose cells are separated by pipes, tabs, or wide gaps.

use carbonscan_domain::Table;
use regex::Regex;
use std::sync::LazyLock;

static CELL_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid cell gap pattern"));

/// Finds tables in linear page text
#[derive(Debug, Clone)]
pub struct TableDetector {
    min_rows: usize,
    min_columns: usize,
}

impl TableDetector {
    /// Create a detector
    pub fn new(min_rows: usize, min_columns: usize) -> Self {
        Self {
            min_rows: min_rows.max(1),
            min_columns: min_columns.max(2),
        }
    }

    /// Split a line into cells
    ///
    /// Pipes win over tabs, tabs over runs of two or more spaces. Border
    /// pipes (`| a | b |`) do not produce empty edge cells.
    pub fn split_cells(line: &str) -> Vec<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let cells: Vec<&str> = if trimmed.contains('|') {
            trimmed
                .trim_start_matches('|')
                .trim_end_matches('|')
                .split('|')
                .collect()
        } else if trimmed.contains('\t') {
            trimmed.split('\t').filter(|c| !c.trim().is_empty()).collect()
        } else {
            CELL_GAP.split(trimmed).collect()
        };

        cells.into_iter().map(|cell| cell.trim().to_string()).collect()
    }

    /// Detect tables in page text, in order of appearance
    ///
    /// ```
    /// use carbonscan_segmenter::TableDetector;
    ///
    /// let text = "Our emissions fell.\n\
    ///             Metric      2023     2022\n\
    ///             Scope 1     1,200    1,350\n\
    ///             Scope 2     800      910\n\
    ///             Thank you.";
    /// let tables = TableDetector::new(2, 2).detect(text);
    /// assert_eq!(tables.len(), 1);
    /// assert_eq!(tables[0].rows[1], vec!["Scope 1", "1,200", "1,350"]);
    /// ```
    pub fn detect(&self, text: &str) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut run: Vec<Vec<String>> = Vec::new();

        for line in text.lines() {
            let cells = Self::split_cells(line);
            if cells.len() >= self.min_columns {
                run.push(cells);
            } else {
                self.close_run(&mut run, &mut tables);
            }
        }
        self.close_run(&mut run, &mut tables);

        tables
    }

    fn close_run(&self, run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
        let rows = std::mem::take(run);
        let has_digit = rows
            .iter()
            .flatten()
            .any(|cell| cell.chars().any(|c| c.is_ascii_digit()));

        if rows.len() >= self.min_rows && has_digit {
            tables.push(Table::new(rows));
        }
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new(2, 2)
    }
}
