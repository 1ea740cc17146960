//! Classified spans and the chunks built from them

use std::collections::BTreeSet;
use std::fmt;

/// What kind of region a span covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// A whole table (atomic, never split)
    Table,
    /// A window of text anchored on a line naming a scope with a number
    ScopeLine,
    /// A window of text opened by a target section heading, or context
    Narrative,
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanKind::Table => write!(f, "table"),
            SpanKind::ScopeLine => write!(f, "scope_line"),
            SpanKind::Narrative => write!(f, "narrative"),
        }
    }
}

/// Where on its page a span comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanLocation {
    /// Text lines `start..end` (0-based, end exclusive)
    Lines {
        /// First line included
        start: usize,
        /// One past the last line included
        end: usize,
    },
    /// The n-th accepted table on the page (1-based)
    Table {
        /// Table ordinal on the page
        ordinal: usize,
    },
}

/// A classified, contiguous region of one page
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSpan {
    /// Region kind
    pub kind: SpanKind,

    /// Page the region belongs to (1-based)
    pub page_index: usize,

    /// Lines or table ordinal on that page
    pub location: SpanLocation,

    /// Likelihood of containing target data (>= 0)
    pub relevance_score: f64,

    /// Serialized form sent to the reasoning service
    pub text: String,
}

impl ClassifiedSpan {
    /// Serialized length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this span is an atomic table
    pub fn is_table(&self) -> bool {
        self.kind == SpanKind::Table
    }

    /// Whether two spans describe the same region with the same content
    pub fn same_region(&self, other: &ClassifiedSpan) -> bool {
        self.page_index == other.page_index
            && self.location == other.location
            && self.text == other.text
    }
}

/// A bounded unit of work for the reasoning service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    /// 0-based position among the document's chunks (stable tie-breaker)
    pub index: usize,

    /// Spans in document order
    pub spans: Vec<ClassifiedSpan>,

    /// Pages touched by the spans
    pub page_indices: BTreeSet<usize>,

    /// Set when a single table exceeds the size budget on its own
    pub oversized: bool,
}

impl Chunk {
    /// Separator placed between serialized spans
    pub const SEPARATOR: &'static str = "\n";

    /// Create an empty chunk
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Append a span, recording its page
    pub fn push(&mut self, span: ClassifiedSpan) {
        self.page_indices.insert(span.page_index);
        self.spans.push(span);
    }

    /// Serialized text of all spans
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join(Self::SEPARATOR)
    }

    /// Serialized length in characters, separators included
    pub fn char_len(&self) -> usize {
        let spans: usize = self.spans.iter().map(ClassifiedSpan::char_len).sum();
        spans + self.spans.len().saturating_sub(1) * Self::SEPARATOR.len()
    }

    /// Whether the chunk holds no spans
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
