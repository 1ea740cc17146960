//! Error types for the Segmenter

use thiserror::Error;

/// Errors that can occur during segmentation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    /// The document could not be opened at all
    #[error("Unparseable document: {0}")]
    Unparseable(String),

    /// A single page failed; the page is emitted empty and the document continues
    #[error("Page {index} failed: {reason}")]
    Page {
        /// 1-based page index
        index: usize,
        /// What went wrong
        reason: String,
    },
}
