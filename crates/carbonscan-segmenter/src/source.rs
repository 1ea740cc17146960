//! Page sources: the per-page primitives a parser backend provides

use crate::layout::PositionedWord;
use crate::SegmentationError;
use carbonscan_domain::Table;

/// A parsed document that can be read one page at a time
///
/// Page indices are 1-based. Each primitive may fail (or panic) for a single
/// page without affecting the others.
pub trait PageSource {
    /// Number of physical pages
    fn page_count(&self) -> usize;

    /// Words with positions, when the backend knows them
    ///
    /// `Ok(None)` means the backend has no layout data; the segmenter then
    /// uses [`PageSource::text`].
    fn words(&self, _index: usize) -> Result<Option<Vec<PositionedWord>>, SegmentationError> {
        Ok(None)
    }

    /// Linear text of the page in reading order
    fn text(&self, index: usize) -> Result<String, SegmentationError>;

    /// Tables found on the page, in detection order
    fn tables(&self, index: usize) -> Result<Vec<Table>, SegmentationError>;
}
