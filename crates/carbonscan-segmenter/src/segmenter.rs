//! Document to page segmentation

use crate::layout::reconstruct_lines;
use crate::source::PageSource;
use crate::{HtmlSource, PdfSource, SegmentationError, SegmenterConfig, TableDetector};
use carbonscan_domain::{Document, Page, SourceKind, Table};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Pages plus the per-page failures that were absorbed producing them
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Pages 1..N in order, failed pages included (empty)
    pub pages: Vec<Page>,
    /// One entry per failed page primitive, as `SegmentationError::Page`
    pub failures: Vec<SegmentationError>,
}

impl Segmentation {
    /// Distinct page indices that had any failure
    pub fn failed_pages(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .failures
            .iter()
            .filter_map(|failure| match failure {
                SegmentationError::Page { index, .. } => Some(*index),
                SegmentationError::Unparseable(_) => None,
            })
            .collect();
        indices.dedup();
        indices
    }
}

/// Turns documents into ordered pages with detected tables
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a segmenter
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a document into pages
    ///
    /// Consumes the document. Page failures are absorbed; only a document
    /// that cannot be opened at all is an error.
    pub fn segment(&self, document: Document) -> Result<Vec<Page>, SegmentationError> {
        self.segment_detailed(document).map(|segmentation| segmentation.pages)
    }

    /// Segment a document, also reporting absorbed page failures
    pub fn segment_detailed(&self, document: Document) -> Result<Segmentation, SegmentationError> {
        let Document {
            url,
            source_kind,
            bytes,
            ..
        } = document;

        let segmentation = match source_kind {
            SourceKind::Pdf => {
                let detector = self.config.detect_text_tables.then(|| {
                    TableDetector::new(self.config.min_table_rows, self.config.min_table_columns)
                });
                let source = PdfSource::open(&bytes, detector)?;
                self.segment_source(&source)
            }
            SourceKind::Html => {
                let source = HtmlSource::parse(&bytes)?;
                self.segment_source(&source)
            }
        };

        info!(
            "Segmented {} into {} pages ({} failed)",
            url,
            segmentation.pages.len(),
            segmentation.failed_pages().len()
        );
        Ok(segmentation)
    }

    /// Segment any page source
    ///
    /// Produces exactly `page_count()` pages with indices 1..N in order.
    pub fn segment_source<S: PageSource + ?Sized>(&self, source: &S) -> Segmentation {
        let mut segmentation = Segmentation::default();

        for index in 1..=source.page_count() {
            let raw_text = match guarded(index, || self.page_text(source, index)) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Text extraction failed: {}", e);
                    segmentation.failures.push(e);
                    String::new()
                }
            };

            let tables = match guarded(index, || source.tables(index)) {
                Ok(tables) => self.accept_tables(tables),
                Err(e) => {
                    warn!("Table extraction failed: {}", e);
                    segmentation.failures.push(e);
                    Vec::new()
                }
            };

            debug!(
                "Page {}: {} chars, {} tables",
                index,
                raw_text.len(),
                tables.len()
            );
            segmentation.pages.push(Page::new(index, raw_text, tables));
        }

        segmentation
    }

    fn page_text<S: PageSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<String, SegmentationError> {
        match source.words(index) {
            Ok(Some(words)) if !words.is_empty() => {
                Ok(reconstruct_lines(&words, self.config.line_tolerance))
            }
            Ok(_) => source.text(index),
            Err(e) => {
                debug!("No word positions ({}), using linear text", e);
                source.text(index)
            }
        }
    }

    fn accept_tables(&self, tables: Vec<Table>) -> Vec<Table> {
        tables
            .into_iter()
            .filter(|table| table.row_count() >= self.config.min_table_rows && table.has_content())
            .collect()
    }
}

/// Run one page primitive, turning a panic into a page error
fn guarded<T>(
    index: usize,
    f: impl FnOnce() -> Result<T, SegmentationError>,
) -> Result<T, SegmentationError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "parser panicked".to_string());
            Err(SegmentationError::Page { index, reason })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PositionedWord;

    struct StubSource {
        pages: Vec<&'static str>,
        words_on: Option<usize>,
    }

    impl PageSource for StubSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn words(&self, index: usize) -> Result<Option<Vec<PositionedWord>>, SegmentationError> {
            if self.words_on == Some(index) {
                Ok(Some(vec![
                    PositionedWord::new("right", 100.0, 10.0),
                    PositionedWord::new("left", 0.0, 11.0),
                ]))
            } else {
                Ok(None)
            }
        }

        fn text(&self, index: usize) -> Result<String, SegmentationError> {
            Ok(self.pages[index - 1].to_string())
        }

        fn tables(&self, index: usize) -> Result<Vec<Table>, SegmentationError> {
            Ok(vec![
                Table::new(vec![vec![format!("only row {}", index)]]),
                Table::new(vec![vec![String::new()], vec![String::new()]]),
                Table::new(vec![vec!["Scope 1".to_string()], vec!["10".to_string()]]),
            ])
        }
    }

    #[test]
    fn test_word_positions_preferred_over_linear_text() {
        let source = StubSource {
            pages: vec!["linear one", "linear two"],
            words_on: Some(2),
        };
        let pages = Segmenter::default().segment_source(&source).pages;

        assert_eq!(pages[0].raw_text, "linear one");
        assert_eq!(pages[1].raw_text, "left right");
    }

    #[test]
    fn test_single_row_and_blank_tables_rejected() {
        let source = StubSource {
            pages: vec!["p"],
            words_on: None,
        };
        let pages = Segmenter::default().segment_source(&source).pages;

        assert_eq!(pages[0].tables.len(), 1);
        assert_eq!(pages[0].tables[0].rows[0], vec!["Scope 1"]);
    }

    #[test]
    fn test_html_document() {
        let document = Document::new(
            "https://example.com/esg.html",
            SourceKind::Html,
            b"<h1>Climate Change</h1><table><tr><td>Scope 1</td><td>5</td></tr><tr><td>Scope 2</td><td>6</td></tr></table>".to_vec(),
        );
        let pages = Segmenter::default().segment(document).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].index, 1);
        assert_eq!(pages[0].raw_text, "Climate Change");
        assert_eq!(pages[0].tables.len(), 1);
    }

    #[test]
    fn test_garbage_pdf_is_unparseable() {
        let document = Document::new("u", SourceKind::Pdf, b"not a pdf".to_vec());
        assert!(matches!(
            Segmenter::default().segment(document),
            Err(SegmentationError::Unparseable(_))
        ));
    }

    #[test]
    fn test_guarded_captures_panic_message() {
        let result: Result<(), _> = guarded(7, || panic!("bad xref"));
        assert_eq!(
            result.unwrap_err(),
            SegmentationError::Page {
                index: 7,
                reason: "bad xref".to_string()
            }
        );
    }
}
