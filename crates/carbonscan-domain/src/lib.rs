//! Carbonscan Domain Layer
//!
//! This crate contains the data model shared by every stage of the emissions
//! ingestion pipeline, plus the trait interfaces for the two external
//! collaborators (document fetching and the reasoning service).
//!
//! ## Key Concepts
//!
//! - **Document**: raw bytes of a sustainability disclosure (PDF or HTML)
//! - **Page / Table**: ordered, immutable units produced by segmentation
//! - **ClassifiedSpan**: a page region judged likely to hold emissions data
//! - **Chunk**: a bounded-size unit of work for the reasoning service
//! - **CandidateResult**: one chunk's raw, un-normalized answer
//! - **EmissionRecord**: the merged, normalized terminal artifact
//!
//! ## Architecture
//!
//! - Only lightweight dependencies (identifiers, serialization, async traits)
//! - No I/O and no parsing logic
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod emission;
pub mod page;
pub mod record_id;
pub mod span;
pub mod traits;

// Re-exports for convenience
pub use document::{Document, SourceKind};
pub use emission::{
    CandidateResult, EmissionRecord, EmissionYear, ReportedPeriod, ReportedScope,
    ScopeCategory, ScopeEmission, CANONICAL_UNIT,
};
pub use page::{Page, Table};
pub use record_id::RecordId;
pub use span::{Chunk, ClassifiedSpan, SpanKind, SpanLocation};
pub use traits::{ContentFetcher, ReasoningService};
