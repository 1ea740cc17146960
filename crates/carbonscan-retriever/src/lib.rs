//! Carbonscan Retriever
//!
//! Fetches sustainability disclosures (PDF or HTML) over HTTP(S) and hands
//! them to segmentation as [`Document`](carbonscan_domain::Document)s.
//!
//! # Limits
//!
//! - Declared user agent and per-request timeout
//! - Maximum body size, checked against `Content-Length` and while streaming
//! - Content-type check (`.pdf` URLs must be served as `application/pdf`)
//! - Exponential backoff retries on error statuses and transport failures
//!
//! # Example Usage
//!
//! ```no_run
//! use carbonscan_retriever::{Retriever, RetrieverConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = Retriever::new(RetrieverConfig::default())?;
//! let document = retriever.fetch("https://example.com/esg-report-2023.pdf").await?;
//! println!("{} bytes of {}", document.len(), document.source_kind);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod retriever;

pub use config::{RetrieverConfig, DEFAULT_USER_AGENT};
pub use error::FetchError;
pub use retriever::{expected_kind, parse_url, resolve_kind, Retriever};
