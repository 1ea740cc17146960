//! End-to-end document processing
//!
//! Retrieve → Segment → Classify → Chunk → Extract → Aggregate, one document
//! at a time. Chunk extraction is the only concurrent stage.

use crate::adapter::ExtractionAdapter;
use crate::aggregator::aggregate;
use crate::chunking::ChunkBuilder;
use crate::classifier::Classifier;
use crate::config::PipelineConfig;
use crate::error::{AggregationError, ExtractionError, PipelineError};
use crate::metrics::{PipelineMetrics, Stage};
use crate::types::{ChunkFailure, CompanyContext, DocumentRequest, PipelineOutcome};
use carbonscan_domain::{
    CandidateResult, Chunk, ContentFetcher, Document, Page, ReasoningService,
};
use carbonscan_retriever::{FetchError, Retriever};
use carbonscan_segmenter::Segmenter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What the extraction stage produced
struct Extraction {
    candidates: Vec<CandidateResult>,
    failures: Vec<ChunkFailure>,
    cancelled: bool,
}

/// Turns document URLs into emission records
pub struct Pipeline<F, R>
where
    F: ContentFetcher<Error = FetchError>,
    R: ReasoningService,
{
    fetcher: F,
    adapter: ExtractionAdapter<R>,
    segmenter: Segmenter,
    classifier: Classifier,
    chunker: ChunkBuilder,
    config: PipelineConfig,
}

impl<R> Pipeline<Retriever, R>
where
    R: ReasoningService + 'static,
{
    /// Create a pipeline that fetches over HTTP with the configured retriever
    pub fn with_retriever(service: R, config: PipelineConfig) -> Result<Self, PipelineError> {
        let retriever = Retriever::new(config.retriever.clone())?;
        Self::new(retriever, service, config)
    }
}

impl<F, R> Pipeline<F, R>
where
    F: ContentFetcher<Error = FetchError>,
    R: ReasoningService + 'static,
{
    /// Create a pipeline
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if any configuration section is invalid.
    pub fn new(fetcher: F, service: R, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let classifier = Classifier::new(config.classifier.clone(), config.span_limit())?;

        Ok(Self {
            fetcher,
            adapter: ExtractionAdapter::new(Arc::new(service), config.extraction.call_timeout()),
            segmenter: Segmenter::new(config.segmenter.clone()),
            classifier,
            chunker: ChunkBuilder::new(config.chunking.max_chars),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch and process one document
    pub async fn process(&self, request: DocumentRequest) -> Result<PipelineOutcome, PipelineError> {
        self.process_with_cancel(request, std::future::pending()).await
    }

    /// Fetch and process one document, stopping early when `cancel` resolves
    ///
    /// Cancellation during extraction aborts in-flight calls and aggregates
    /// what already completed. Cancellation before any chunk completed
    /// yields `AggregationError::NoCandidates`.
    pub async fn process_with_cancel<C>(
        &self,
        request: DocumentRequest,
        cancel: C,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        C: Future<Output = ()>,
    {
        let cancel = self.with_deadline(cancel);
        tokio::pin!(cancel);

        info!("Processing {}", request.url);
        let started = Instant::now();
        let document = tokio::select! {
            fetched = self.fetcher.fetch(&request.url) => fetched?,
            _ = &mut cancel => {
                warn!("Cancelled while fetching {}", request.url);
                return Err(AggregationError::NoCandidates.into());
            }
        };
        let fetch_elapsed = started.elapsed();

        let mut outcome = self.run(document, request.context(), cancel).await?;
        outcome.metrics.record_stage(Stage::Retrieve, fetch_elapsed);
        Ok(outcome)
    }

    /// Process an already-fetched document
    pub async fn process_document(
        &self,
        document: Document,
        context: CompanyContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.process_document_with_cancel(document, context, std::future::pending())
            .await
    }

    /// Process an already-fetched document, stopping early when `cancel`
    /// resolves
    pub async fn process_document_with_cancel<C>(
        &self,
        document: Document,
        context: CompanyContext,
        cancel: C,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        C: Future<Output = ()>,
    {
        let cancel = self.with_deadline(cancel);
        tokio::pin!(cancel);
        self.run(document, context, cancel).await
    }

    /// Combine the caller's cancellation with the document deadline
    pub(crate) fn with_deadline<C>(&self, cancel: C) -> impl Future<Output = ()>
    where
        C: Future<Output = ()>,
    {
        let deadline = self.config.extraction.document_timeout();
        async move {
            match deadline {
                Some(limit) => tokio::select! {
                    _ = cancel => {}
                    _ = tokio::time::sleep(limit) => {
                        warn!("Document deadline of {}s elapsed", limit.as_secs());
                    }
                },
                None => cancel.await,
            }
        }
    }

    async fn run<C>(
        &self,
        document: Document,
        context: CompanyContext,
        mut cancel: Pin<&mut C>,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        C: Future<Output = ()>,
    {
        let mut metrics = PipelineMetrics::new();
        let source_url = document.url.clone();
        let report_year = context.year_hint.or(document.year_hint);

        let started = Instant::now();
        let segmenter = self.segmenter.clone();
        let segmentation = tokio::select! {
            joined = tokio::task::spawn_blocking(move || segmenter.segment_detailed(document)) => {
                joined.map_err(|e| PipelineError::Worker(e.to_string()))??
            }
            _ = &mut cancel => {
                warn!("Cancelled while segmenting {}", source_url);
                return Err(AggregationError::NoCandidates.into());
            }
        };
        metrics.record_stage(Stage::Segment, started.elapsed());
        metrics.failed_pages = segmentation.failed_pages().len();
        let warnings = segmentation.failures.iter().map(|e| e.to_string()).collect();

        info!("{}: {} pages", source_url, segmentation.pages.len());
        let mut outcome = self
            .process_pages(&segmentation.pages, &context, metrics, warnings, cancel)
            .await?;

        outcome.record.source_url = Some(source_url);
        outcome.record.report_year = report_year;
        Ok(outcome)
    }

    /// Classify, chunk, extract and aggregate already-segmented pages
    pub(crate) async fn process_pages<C>(
        &self,
        pages: &[Page],
        context: &CompanyContext,
        mut metrics: PipelineMetrics,
        mut warnings: Vec<String>,
        cancel: Pin<&mut C>,
    ) -> Result<PipelineOutcome, PipelineError>
    where
        C: Future<Output = ()>,
    {
        metrics.pages = pages.len();
        if pages.is_empty() {
            return Err(PipelineError::NoPages);
        }

        // Classify
        let started = Instant::now();
        let spans = self.classifier.classify_document(pages);
        for span in &spans {
            metrics.record_span(span.kind);
        }
        metrics.record_stage(Stage::Classify, started.elapsed());

        // Chunk
        let started = Instant::now();
        let chunks = self.chunker.build(spans);
        metrics.record_stage(Stage::Chunk, started.elapsed());
        metrics.chunks = chunks.len();
        for chunk in chunks.iter().filter(|chunk| chunk.oversized) {
            metrics.oversized_chunks += 1;
            warnings.push(format!(
                "chunk {}: single table of {} chars exceeds the {} char limit",
                chunk.index,
                chunk.char_len(),
                self.chunker.max_chars()
            ));
        }

        if chunks.is_empty() {
            return Err(PipelineError::NoChunks);
        }
        info!(
            "{} spans packed into {} chunks",
            metrics.total_spans(),
            metrics.chunks
        );

        // Extract
        let started = Instant::now();
        let extraction = self.extract_all(chunks, context, &mut metrics, cancel).await;
        metrics.record_stage(Stage::Extract, started.elapsed());
        warnings.extend(extraction.failures.iter().map(ToString::to_string));
        if extraction.cancelled {
            warnings.push(format!(
                "extraction stopped early; {} chunk(s) abandoned",
                metrics.extractions_abandoned
            ));
        }

        // Aggregate
        let started = Instant::now();
        let mut record = aggregate(extraction.candidates)?;
        metrics.record_stage(Stage::Aggregate, started.elapsed());

        record.report_year = context.year_hint;
        if context.name.is_some() {
            record.company = context.name.clone();
        }
        record.warnings = warnings;

        info!(
            "Record {}: {} previous years, {} warnings",
            record.id,
            record.previous_years.len(),
            record.warnings.len()
        );
        debug!("{}", metrics.summary());

        Ok(PipelineOutcome {
            record,
            metrics,
            failures: extraction.failures,
            cancelled: extraction.cancelled,
        })
    }

    async fn extract_all<C>(
        &self,
        chunks: Vec<Chunk>,
        context: &CompanyContext,
        metrics: &mut PipelineMetrics,
        mut cancel: Pin<&mut C>,
    ) -> Extraction
    where
        C: Future<Output = ()>,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.extraction.concurrency));
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            let adapter = self.adapter.clone();
            let semaphore = Arc::clone(&semaphore);
            let context = context.clone();
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => adapter.extract(&chunk, &context).await,
                    Err(e) => Err(ExtractionError::ServiceError(e.to_string())),
                };
                (chunk.index, result)
            });
        }

        let mut extraction = Extraction {
            candidates: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        };

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((_, Ok(candidate)))) => {
                        metrics.extractions_succeeded += 1;
                        extraction.candidates.push(candidate);
                    }
                    Some(Ok((index, Err(e)))) => {
                        warn!("Chunk {} failed: {}", index, e);
                        metrics.extractions_failed += 1;
                        extraction.failures.push(ChunkFailure {
                            chunk_index: Some(index),
                            reason: e.to_string(),
                        });
                    }
                    Some(Err(e)) => {
                        warn!("Chunk task failed: {}", e);
                        metrics.extractions_failed += 1;
                        extraction.failures.push(ChunkFailure {
                            chunk_index: None,
                            reason: e.to_string(),
                        });
                    }
                },
                _ = &mut cancel => {
                    metrics.extractions_abandoned = tasks.len();
                    warn!("Extraction cancelled with {} chunk(s) outstanding", tasks.len());
                    tasks.abort_all();
                    extraction.cancelled = true;
                    break;
                }
            }
        }

        extraction
    }
}
