//! Raw documents as handed from the retriever to the segmenter

use std::fmt;

/// Kind of source a document was fetched as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Portable Document Format bytes
    Pdf,
    /// HTML markup
    Html,
}

impl SourceKind {
    /// Infer the kind from a declared content type (`Content-Type` header value)
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonscan_domain::SourceKind;
    ///
    /// assert_eq!(SourceKind::from_content_type("application/pdf"), Some(SourceKind::Pdf));
    /// assert_eq!(SourceKind::from_content_type("text/html; charset=utf-8"), Some(SourceKind::Html));
    /// assert_eq!(SourceKind::from_content_type("image/png"), None);
    /// ```
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("application/pdf") {
            Some(SourceKind::Pdf)
        } else if lowered.contains("text/html") || lowered.contains("application/xhtml+xml") {
            Some(SourceKind::Html)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Html => write!(f, "html"),
        }
    }
}

/// A fetched document
///
/// Owned by the retriever until handed to the segmenter, which consumes it.
#[derive(Clone, PartialEq)]
pub struct Document {
    /// URL the document was fetched from
    pub url: String,

    /// Whether the bytes are a PDF or HTML
    pub source_kind: SourceKind,

    /// Declared content type, if the server sent one
    pub content_type: Option<String>,

    /// Raw body bytes
    pub bytes: Vec<u8>,

    /// Reporting-year hint supplied by document discovery
    pub year_hint: Option<i32>,
}

impl Document {
    /// Create a new document
    pub fn new(url: impl Into<String>, source_kind: SourceKind, bytes: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            source_kind,
            content_type: None,
            bytes,
            year_hint: None,
        }
    }

    /// Attach the declared content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach a reporting-year hint
    pub fn with_year_hint(mut self, year: i32) -> Self {
        self.year_hint = Some(year);
        self
    }

    /// Size of the body in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bodies can be tens of megabytes; keep Debug output readable.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("source_kind", &self.source_kind)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("year_hint", &self.year_hint)
            .finish()
    }
}
