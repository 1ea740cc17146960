//! Carbonscan Segmenter
//!
//! Splits a fetched [`Document`](carbonscan_domain::Document) into ordered
//! [`Page`](carbonscan_domain::Page)s with their tables.
//!
//! # Architecture
//!
//! ```text
//! Document → PageSource (PDF | HTML) → per-page text + tables → Vec<Page>
//! ```
//!
//! - **PdfSource**: each physical page rendered on its own via `pdf-extract`,
//!   character positions grouped into words, tables from the text-layout
//!   [`TableDetector`]
//! - **HtmlSource**: one page; all text outside tables, one line per block
//!   element, `<table>` markup for tables
//! - **reconstruct_lines**: rebuilds lines from positioned words
//!
//! A page that fails (error or parser panic) is emitted empty and the
//! document continues; N pages in always means N pages out, indexed 1..N.
//!
//! # Example Usage
//!
//! ```
//! use carbonscan_domain::{Document, SourceKind};
//! use carbonscan_segmenter::Segmenter;
//!
//! let html = b"<h2>GHG Emissions</h2><p>Scope 1: 1,200 tCO2e</p>".to_vec();
//! let document = Document::new("https://example.com/esg.html", SourceKind::Html, html);
//!
//! let pages = Segmenter::default().segment(document).unwrap();
//! assert_eq!(pages.len(), 1);
//! assert_eq!(pages[0].raw_text, "GHG Emissions\nScope 1: 1,200 tCO2e");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod html;
mod layout;
mod pdf;
mod segmenter;
mod source;
mod table;

pub use config::SegmenterConfig;
pub use error::SegmentationError;
pub use html::HtmlSource;
pub use layout::{reconstruct_lines, PositionedWord};
pub use pdf::PdfSource;
pub use segmenter::{Segmentation, Segmenter};
pub use source::PageSource;
pub use table::TableDetector;
