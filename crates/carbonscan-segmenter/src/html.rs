//! HTML page source backed by `scraper`
//!
//! An HTML document is a single page. Text comes from every text node outside
//! tables and non-content elements, broken into lines at block boundaries;
//! tables come from `<table>` markup.

use crate::source::PageSource;
use crate::SegmentationError;
use carbonscan_domain::Table;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

const BLOCK_TAGS: [&str; 38] = [
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "details",
    "dialog", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "summary", "td", "th", "tr", "ul",
];

const SKIPPED_TAGS: [&str; 7] = ["head", "script", "style", "noscript", "template", "svg", "iframe"];

static CAPTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("valid caption selector"));
static TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid cell selector"));

/// A parsed HTML document
#[derive(Debug, Clone)]
pub struct HtmlSource {
    text: String,
    tables: Vec<Table>,
}

impl HtmlSource {
    /// Parse HTML bytes (decoded lossily as UTF-8)
    ///
    /// # Errors
    ///
    /// Returns `SegmentationError::Unparseable` if the body is empty.
    pub fn parse(bytes: &[u8]) -> Result<Self, SegmentationError> {
        let markup = String::from_utf8_lossy(bytes);
        if markup.trim().is_empty() {
            return Err(SegmentationError::Unparseable("empty HTML body".to_string()));
        }

        let document = Html::parse_document(&markup);

        let mut lines = TextLines::default();
        collect_text(document.root_element(), &mut lines);
        let text = lines.finish();

        let tables = document
            .select(&TABLES)
            .map(|table| {
                let rows = table
                    .select(&ROWS)
                    .filter(|row| nearest(row, "table") == Some(table))
                    .map(|row| {
                        row.select(&CELLS)
                            .filter(|cell| nearest(cell, "tr") == Some(row))
                            .map(|cell| collapse_whitespace(&cell))
                            .collect::<Vec<_>>()
                    })
                    .filter(|cells| !cells.is_empty())
                    .collect();
                Table::new(rows)
            })
            .collect();

        Ok(Self { text, tables })
    }
}

impl PageSource for HtmlSource {
    fn page_count(&self) -> usize {
        1
    }

    fn text(&self, index: usize) -> Result<String, SegmentationError> {
        check_index(index)?;
        Ok(self.text.clone())
    }

    fn tables(&self, index: usize) -> Result<Vec<Table>, SegmentationError> {
        check_index(index)?;
        Ok(self.tables.clone())
    }
}

fn check_index(index: usize) -> Result<(), SegmentationError> {
    if index == 1 {
        Ok(())
    } else {
        Err(SegmentationError::Page {
            index,
            reason: "HTML documents have a single page".to_string(),
        })
    }
}

fn collapse_whitespace(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn ancestor_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap)
}

fn nearest<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    ancestor_elements(element).find(|ancestor| ancestor.value().name() == tag)
}

/// Whitespace-collapsed lines under construction
#[derive(Debug, Default)]
struct TextLines {
    lines: Vec<String>,
    current: Vec<String>,
}

impl TextLines {
    fn push_words(&mut self, text: &str) {
        self.current
            .extend(text.split_whitespace().map(str::to_string));
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(self.current.join(" "));
            self.current.clear();
        }
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

/// Walk text nodes in document order. Tables contribute only their own
/// captions; their cells are read separately.
fn collect_text(element: ElementRef<'_>, lines: &mut TextLines) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            lines.push_words(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        if name == "table" {
            for caption in child
                .select(&CAPTIONS)
                .filter(|caption| nearest(caption, "table") == Some(child))
            {
                lines.break_line();
                lines.push_words(&collapse_whitespace(&caption));
                lines.break_line();
            }
            continue;
        }

        let block = BLOCK_TAGS.contains(&name);
        if block {
            lines.break_line();
        }
        collect_text(child, lines);
        if block {
            lines.break_line();
        }
    }
}
