//! Per-document pipeline metrics

use carbonscan_domain::SpanKind;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Pipeline stage, for timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Fetching the document
    Retrieve,
    /// Splitting into pages
    Segment,
    /// Selecting relevant spans
    Classify,
    /// Packing spans into chunks
    Chunk,
    /// Reasoning-service calls
    Extract,
    /// Merging candidates
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Retrieve => "retrieve",
            Stage::Segment => "segment",
            Stage::Classify => "classify",
            Stage::Chunk => "chunk",
            Stage::Extract => "extract",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// Counters and timings collected while processing one document
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    /// Pages produced by segmentation
    pub pages: usize,

    /// Pages with a text or table failure
    pub failed_pages: usize,

    /// Spans by kind
    pub spans: BTreeMap<String, usize>,

    /// Chunks built
    pub chunks: usize,

    /// Chunks holding a single table over the size limit
    pub oversized_chunks: usize,

    /// Chunks that produced a candidate
    pub extractions_succeeded: usize,

    /// Chunks whose extraction failed
    pub extractions_failed: usize,

    /// Chunks dropped by cancellation or deadline
    pub extractions_abandoned: usize,

    /// Wall time per stage
    pub stage_durations: BTreeMap<Stage, Duration>,
}

impl PipelineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a span of the given kind
    pub fn record_span(&mut self, kind: SpanKind) {
        *self.spans.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Record time spent in a stage
    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        *self.stage_durations.entry(stage).or_default() += elapsed;
    }

    /// Spans across all kinds
    pub fn total_spans(&self) -> usize {
        self.spans.values().sum()
    }

    /// Time across all stages
    pub fn total_runtime(&self) -> Duration {
        self.stage_durations.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Pages: {} ({} failed)", self.pages, self.failed_pages),
            format!("Chunks: {} ({} oversized)", self.chunks, self.oversized_chunks),
            format!(
                "Extractions: {} succeeded, {} failed, {} abandoned",
                self.extractions_succeeded, self.extractions_failed, self.extractions_abandoned
            ),
            String::new(),
        ];

        if !self.spans.is_empty() {
            lines.push("Spans by kind:".to_string());
            for (kind, count) in &self.spans {
                lines.push(format!("  {}: {}", kind, count));
            }
            lines.push(format!("  Total: {}", self.total_spans()));
            lines.push(String::new());
        }

        if !self.stage_durations.is_empty() {
            lines.push("Stage timings:".to_string());
            for (stage, elapsed) in &self.stage_durations {
                lines.push(format!("  {}: {}ms", stage, elapsed.as_millis()));
            }
            lines.push(format!("  Total: {}ms", self.total_runtime().as_millis()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_counts() {
        let mut metrics = PipelineMetrics::new();
        metrics.record_span(SpanKind::Table);
        metrics.record_span(SpanKind::Table);
        metrics.record_span(SpanKind::ScopeLine);

        assert_eq!(metrics.spans["table"], 2);
        assert_eq!(metrics.spans["scope_line"], 1);
        assert_eq!(metrics.total_spans(), 3);
    }

    #[test]
    fn test_stage_durations_accumulate() {
        let mut metrics = PipelineMetrics::new();
        metrics.record_stage(Stage::Extract, Duration::from_millis(40));
        metrics.record_stage(Stage::Extract, Duration::from_millis(60));
        metrics.record_stage(Stage::Segment, Duration::from_millis(5));

        assert_eq!(metrics.stage_durations[&Stage::Extract], Duration::from_millis(100));
        assert_eq!(metrics.total_runtime(), Duration::from_millis(105));
    }

    #[test]
    fn test_reset() {
        let mut metrics = PipelineMetrics::new();
        metrics.pages = 10;
        metrics.record_span(SpanKind::Narrative);
        metrics.reset();

        assert_eq!(metrics.pages, 0);
        assert_eq!(metrics.total_spans(), 0);
    }

    #[test]
    fn test_summary() {
        let mut metrics = PipelineMetrics::new();
        metrics.pages = 12;
        metrics.failed_pages = 1;
        metrics.chunks = 3;
        metrics.extractions_succeeded = 2;
        metrics.extractions_failed = 1;
        metrics.record_span(SpanKind::Table);
        metrics.record_stage(Stage::Extract, Duration::from_millis(250));

        let summary = metrics.summary();
        assert!(summary.contains("Pages: 12 (1 failed)"));
        assert!(summary.contains("Extractions: 2 succeeded, 1 failed, 0 abandoned"));
        assert!(summary.contains("  table: 1"));
        assert!(summary.contains("  extract: 250ms"));
    }
}
