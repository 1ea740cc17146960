//! HTTP document retrieval

use crate::{FetchError, RetrieverConfig};
use async_trait::async_trait;
use carbonscan_domain::traits::ContentFetcher;
use carbonscan_domain::{Document, SourceKind};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a single attempt
enum Attempt {
    /// Transport failure or error status; worth another try
    Retry(String),
    /// The server answered, but with something we will never accept
    Fatal(FetchError),
}

/// Fetches PDF and HTML documents over HTTP(S)
///
/// Never inspects the body for emissions data; it only enforces transport
/// limits (size, content type, retries).
pub struct Retriever {
    client: reqwest::Client,
    config: RetrieverConfig,
}

impl Retriever {
    /// Create a retriever from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: RetrieverConfig) -> Result<Self, FetchError> {
        config.validate().map_err(FetchError::Client)?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a retriever with default configuration
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(RetrieverConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Fetch the document at `url`
    ///
    /// Error statuses and transport failures are retried with exponential
    /// backoff; size and content-type violations fail immediately.
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let parsed = parse_url(url)?;
        let expected = expected_kind(&parsed);

        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!("Fetching {} (attempt {})", url, attempts);

            match self.attempt(&parsed, expected).await {
                Ok(document) => {
                    info!(
                        "Fetched {} ({} bytes, {})",
                        url,
                        document.len(),
                        document.source_kind
                    );
                    return Ok(document);
                }
                Err(Attempt::Fatal(e)) => {
                    warn!("Rejected {}: {}", url, e);
                    return Err(e);
                }
                Err(Attempt::Retry(reason)) => {
                    if attempts >= self.config.max_attempts {
                        warn!("Giving up on {} after {} attempts: {}", url, attempts, reason);
                        return Err(FetchError::Unreachable {
                            url: url.to_string(),
                            attempts,
                            reason,
                        });
                    }

                    let delay = self.config.backoff_delay(attempts);
                    warn!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempts, url, reason, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &Url, expected: Option<SourceKind>) -> Result<Document, Attempt> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Attempt::Retry(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Attempt::Retry(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let kind = resolve_kind(expected, content_type.as_deref()).map_err(Attempt::Fatal)?;

        let max = self.config.max_bytes;
        if let Some(declared) = response.content_length() {
            if declared > max {
                return Err(Attempt::Fatal(FetchError::TooLarge {
                    size: declared,
                    max,
                }));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Attempt::Retry(format!("body read failed: {}", e)))?
        {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > max {
                return Err(Attempt::Fatal(FetchError::TooLarge { size, max }));
            }
            bytes.extend_from_slice(&chunk);
        }

        let mut document = Document::new(url.as_str(), kind, bytes);
        if let Some(content_type) = content_type {
            document = document.with_content_type(content_type);
        }
        Ok(document)
    }
}

#[async_trait]
impl ContentFetcher for Retriever {
    type Error = FetchError;

    async fn fetch(&self, url: &str) -> Result<Document, Self::Error> {
        Retriever::fetch(self, url).await
    }
}

/// Parse and check a URL: http or https with a host
pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

/// Document kind implied by the URL path, if any
///
/// ```
/// use carbonscan_domain::SourceKind;
/// use carbonscan_retriever::{expected_kind, parse_url};
///
/// let url = parse_url("https://example.com/reports/ESG-2023.PDF?download=1").unwrap();
/// assert_eq!(expected_kind(&url), Some(SourceKind::Pdf));
/// ```
pub fn expected_kind(url: &Url) -> Option<SourceKind> {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".pdf") {
        Some(SourceKind::Pdf)
    } else if path.ends_with(".html") || path.ends_with(".htm") {
        Some(SourceKind::Html)
    } else {
        None
    }
}

/// Decide the document kind from the URL expectation and declared content type
///
/// A `.pdf` URL must be served as `application/pdf`. Otherwise the declared
/// content type decides; an `.html` URL served without any content type is
/// taken at its word.
pub fn resolve_kind(
    expected: Option<SourceKind>,
    content_type: Option<&str>,
) -> Result<SourceKind, FetchError> {
    let declared = content_type.and_then(SourceKind::from_content_type);
    let found = || content_type.unwrap_or("<none>").to_string();

    match (expected, declared) {
        (Some(SourceKind::Pdf), Some(SourceKind::Pdf)) => Ok(SourceKind::Pdf),
        (Some(SourceKind::Pdf), _) => Err(FetchError::WrongContentType {
            expected: "application/pdf".to_string(),
            found: found(),
        }),
        (_, Some(kind)) => Ok(kind),
        (Some(SourceKind::Html), None) if content_type.is_none() => Ok(SourceKind::Html),
        _ => Err(FetchError::WrongContentType {
            expected: "application/pdf or text/html".to_string(),
            found: found(),
        }),
    }
}
