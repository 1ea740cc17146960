//! PDF page source backed by `pdf-extract`
//!
//! The document is parsed once; every page is then rendered on its own so a
//! broken page fails alone. Character positions reported by the renderer are
//! grouped into [`PositionedWord`]s for line reconstruction.

use crate::layout::PositionedWord;
use crate::source::PageSource;
use crate::{SegmentationError, TableDetector};
use carbonscan_domain::Table;
use pdf_extract::{MediaBox, OutputDev, OutputError, PlainTextOutput, Transform};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

enum Backing {
    Parsed {
        document: pdf_extract::Document,
        page_numbers: Vec<u32>,
    },
    Text(Vec<String>),
}

/// Pages of a PDF's text layer
pub struct PdfSource {
    backing: Backing,
    detector: Option<TableDetector>,
}

impl fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfSource")
            .field("pages", &self.page_count())
            .field("detector", &self.detector)
            .finish()
    }
}

impl PdfSource {
    /// Open a PDF from memory
    ///
    /// Only the document structure is read here; page content is rendered
    /// lazily per page.
    ///
    /// # Errors
    ///
    /// Returns `SegmentationError::Unparseable` if the bytes are not a PDF
    /// the parser can open (including parser panics on malformed input).
    pub fn open(bytes: &[u8], detector: Option<TableDetector>) -> Result<Self, SegmentationError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(SegmentationError::Unparseable(
                "missing %PDF header".to_string(),
            ));
        }

        let mut document = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::Document::load_mem(bytes)
        }))
        .map_err(|_| SegmentationError::Unparseable("PDF parser panicked".to_string()))?
        .map_err(|e| SegmentationError::Unparseable(e.to_string()))?;

        if document.is_encrypted() {
            document
                .decrypt("")
                .map_err(|e| SegmentationError::Unparseable(format!("encrypted PDF: {}", e)))?;
        }

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(SegmentationError::Unparseable("PDF has no pages".to_string()));
        }

        debug!("Opened PDF with {} pages", page_numbers.len());
        Ok(Self {
            backing: Backing::Parsed {
                document,
                page_numbers,
            },
            detector,
        })
    }

    /// Build a source from already-extracted page texts
    pub fn from_page_texts(pages: Vec<String>, detector: Option<TableDetector>) -> Self {
        Self {
            backing: Backing::Text(pages),
            detector,
        }
    }

    fn render(&self, index: usize, output: &mut dyn OutputDev) -> Result<(), SegmentationError> {
        let Backing::Parsed {
            document,
            page_numbers,
        } = &self.backing
        else {
            return Ok(());
        };

        let page_number = page_numbers
            .get(index.wrapping_sub(1))
            .copied()
            .ok_or_else(|| out_of_range(index))?;
        pdf_extract::output_doc_page(document, output, page_number).map_err(|e| {
            SegmentationError::Page {
                index,
                reason: e.to_string(),
            }
        })
    }

    fn linear_text(&self, index: usize) -> Result<String, SegmentationError> {
        match &self.backing {
            Backing::Text(pages) => index
                .checked_sub(1)
                .and_then(|i| pages.get(i))
                .cloned()
                .ok_or_else(|| out_of_range(index)),
            Backing::Parsed { .. } => {
                let mut text = String::new();
                self.render(index, &mut PlainTextOutput::new(&mut text))?;
                Ok(text)
            }
        }
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        match &self.backing {
            Backing::Parsed { page_numbers, .. } => page_numbers.len(),
            Backing::Text(pages) => pages.len(),
        }
    }

    fn words(&self, index: usize) -> Result<Option<Vec<PositionedWord>>, SegmentationError> {
        if let Backing::Text(_) = self.backing {
            return Ok(None);
        }
        let mut collector = WordCollector::default();
        self.render(index, &mut collector)?;
        Ok(Some(collector.finish()))
    }

    fn text(&self, index: usize) -> Result<String, SegmentationError> {
        self.linear_text(index)
    }

    fn tables(&self, index: usize) -> Result<Vec<Table>, SegmentationError> {
        let Some(detector) = &self.detector else {
            return Ok(Vec::new());
        };
        Ok(detector.detect(&self.linear_text(index)?))
    }
}

fn out_of_range(index: usize) -> SegmentationError {
    SegmentationError::Page {
        index,
        reason: "page out of range".to_string(),
    }
}

/// Groups rendered characters into words with top-left-origin positions
#[derive(Debug, Default)]
struct WordCollector {
    top: f64,
    words: Vec<PositionedWord>,
    current: String,
    origin: (f64, f64),
    last_end: f64,
    last_y: f64,
}

impl WordCollector {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let text = std::mem::take(&mut self.current);
            let (x, y) = self.origin;
            self.words.push(PositionedWord::new(text, x as f32, y as f32));
        }
    }

    fn finish(mut self) -> Vec<PositionedWord> {
        self.flush();
        self.words
    }
}

impl OutputDev for WordCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.top = media_box.ury;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let size = ((trm.m11 + trm.m21) * font_size * (trm.m12 + trm.m22) * font_size)
            .abs()
            .sqrt();
        let x = trm.m31;
        let y = self.top - trm.m32;

        if char.trim().is_empty() {
            self.flush();
        } else {
            let gap = x > self.last_end + size * 0.1;
            let moved_back = x + size < self.last_end;
            let new_line = (y - self.last_y).abs() > size * 0.5;
            if gap || moved_back || new_line {
                self.flush();
            }
            if self.current.is_empty() {
                self.origin = (x, y);
            }
            self.current.push_str(char);
        }

        self.last_end = x + width * size;
        self.last_y = y;
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        self.flush();
        Ok(())
    }
}
