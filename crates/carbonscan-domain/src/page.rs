//! Pages and tables produced by segmentation

/// A table: ordered rows of ordered cell strings
///
/// The first row is a header candidate and is kept even when it is empty.
/// Rows may have differing column counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Rows in reading order
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from rows
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Header candidate (first row), if any
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|row| row.as_slice())
    }

    /// First cell of every row that has one
    pub fn first_column(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|row| row.first())
            .map(|cell| cell.as_str())
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether any cell contains non-whitespace text
    pub fn has_content(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .any(|cell| !cell.trim().is_empty())
    }

    /// All non-empty cells joined with spaces, row by row
    pub fn flattened_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One physical page of a document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// 1-based position in the document, stable for citation
    pub index: usize,

    /// Extracted text in reading order
    pub raw_text: String,

    /// Tables detected on the page, in detection order
    pub tables: Vec<Table>,
}

impl Page {
    /// Create a page
    pub fn new(index: usize, raw_text: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            index,
            raw_text: raw_text.into(),
            tables,
        }
    }

    /// A page whose extraction failed: keeps its index, carries no content
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            raw_text: String::new(),
            tables: Vec::new(),
        }
    }

    /// Text lines of the page
    pub fn lines(&self) -> Vec<&str> {
        self.raw_text.lines().collect()
    }

    /// Whether the page has neither text nor tables
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty() && self.tables.is_empty()
    }
}
