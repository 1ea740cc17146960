//! Relevance classification of pages into spans
//!
//! Priority per region is table first, then scope line, then section
//! heading. Text spans are widened by the configured context, merged when
//! they overlap or touch, and split at line boundaries when they outgrow the
//! span limit. Tables are never split.

use crate::config::ClassifierConfig;
use crate::error::ConfigError;
use crate::render::{render_table, render_text};
use crate::rules::RuleSet;
use carbonscan_domain::{ClassifiedSpan, Page, SpanKind, SpanLocation, Table};
use tracing::debug;

/// A candidate text region on one page, before rendering
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    start: usize,
    end: usize,
    kind: SpanKind,
    score: f64,
}

impl Window {
    fn absorb(&mut self, other: Window) {
        self.end = self.end.max(other.end);
        self.score += other.score;
        if other.kind == SpanKind::ScopeLine {
            self.kind = SpanKind::ScopeLine;
        }
    }
}

#[derive(Debug, Default)]
struct PageAnalysis {
    tables: Vec<ClassifiedSpan>,
    windows: Vec<Window>,
}

impl PageAnalysis {
    fn is_relevant(&self) -> bool {
        !self.tables.is_empty() || self.windows.iter().any(|w| w.kind == SpanKind::ScopeLine)
    }
}

/// A classified region before text splitting
enum Region {
    Table(ClassifiedSpan),
    Text {
        whole: ClassifiedSpan,
        position: usize,
        window: Window,
    },
}

impl Region {
    fn span(&self) -> &ClassifiedSpan {
        match self {
            Region::Table(span) => span,
            Region::Text { whole, .. } => whole,
        }
    }
}

/// Selects the regions of a document likely to hold emissions figures
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
    config: ClassifierConfig,
    span_limit: usize,
}

impl Classifier {
    /// Create a classifier; text spans longer than `span_limit` characters
    /// are split
    pub fn new(config: ClassifierConfig, span_limit: usize) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;
        let rules = RuleSet::from_config(&config)?;
        for rule in rules.rules() {
            debug!("Rule '{}': {} (weight {})", rule.name, rule.kind, rule.weight);
        }

        Ok(Self {
            rules,
            config,
            span_limit: span_limit.max(1),
        })
    }

    /// Classify a single page, without neighbouring-page context
    pub fn classify(&self, page: &Page) -> Vec<ClassifiedSpan> {
        self.classify_document(std::slice::from_ref(page))
    }

    /// Classify every page of a document
    ///
    /// Spans come out in page order; within a page, tables first, then text
    /// in line order. Identical regions are emitted once; a text region is
    /// split only after that, so every piece of a kept region survives.
    pub fn classify_document(&self, pages: &[Page]) -> Vec<ClassifiedSpan> {
        let mut analyses: Vec<PageAnalysis> = pages.iter().map(|page| self.analyze(page)).collect();

        let relevant: Vec<usize> = analyses
            .iter()
            .enumerate()
            .filter(|(_, analysis)| analysis.is_relevant())
            .map(|(position, _)| position)
            .collect();

        let reach = self.config.adjacent_pages;
        for (position, page) in pages.iter().enumerate() {
            if analyses[position].is_relevant() || page.is_blank() {
                continue;
            }
            let near = relevant.iter().any(|&r| r.abs_diff(position) <= reach);
            if near {
                analyses[position].windows.push(Window {
                    start: 0,
                    end: page.lines().len(),
                    kind: SpanKind::Narrative,
                    score: 0.0,
                });
            }
        }

        let mut regions = Vec::new();
        for (position, (page, analysis)) in pages.iter().zip(analyses).enumerate() {
            regions.extend(analysis.tables.into_iter().map(Region::Table));
            let lines = page.lines();
            for window in merge(analysis.windows) {
                let body = &lines[window.start..window.end];
                if body.iter().all(|line| line.trim().is_empty()) {
                    continue;
                }
                let whole = ClassifiedSpan {
                    kind: window.kind,
                    page_index: page.index,
                    location: SpanLocation::Lines {
                        start: window.start,
                        end: window.end,
                    },
                    relevance_score: window.score,
                    text: render_text(page.index, window.start, body),
                };
                regions.push(Region::Text { whole, position, window });
            }
        }

        let mut spans = Vec::new();
        for region in dedupe(regions) {
            match region {
                Region::Table(span) => spans.push(span),
                Region::Text { whole, .. } if whole.char_len() <= self.span_limit => {
                    spans.push(whole)
                }
                Region::Text { position, window, .. } => {
                    let page = &pages[position];
                    spans.extend(self.text_spans(page.index, &page.lines(), window));
                }
            }
        }

        debug!(
            "Classified {} pages into {} spans (rules v{})",
            pages.len(),
            spans.len(),
            self.rules.version()
        );
        spans
    }

    fn analyze(&self, page: &Page) -> PageAnalysis {
        let mut analysis = PageAnalysis::default();

        for (position, table) in page.tables.iter().enumerate() {
            if let Some(score) = self.score_table(table) {
                let ordinal = position + 1;
                analysis.tables.push(ClassifiedSpan {
                    kind: SpanKind::Table,
                    page_index: page.index,
                    location: SpanLocation::Table { ordinal },
                    relevance_score: score,
                    text: render_table(table, ordinal, page.index, &self.rules),
                });
            }
        }

        let lines = page.lines();
        let context = self.config.context_lines;
        for (i, line) in lines.iter().enumerate() {
            if let Some(rule) = self.rules.scope_rule(line) {
                analysis.windows.push(Window {
                    start: i.saturating_sub(context),
                    end: (i + 1 + context).min(lines.len()),
                    kind: rule.kind,
                    score: rule.weight,
                });
            } else if let Some(rule) = self.rules.section_rule(line) {
                let section_end = lines[i + 1..]
                    .iter()
                    .position(|next| self.rules.is_heading_like(next))
                    .map_or(lines.len(), |offset| i + 1 + offset);
                analysis.windows.push(Window {
                    start: i.saturating_sub(context),
                    end: (section_end + context).min(lines.len()),
                    kind: rule.kind,
                    score: rule.weight,
                });
            }
        }

        analysis
    }

    /// Score a table, or `None` if it shows no sign of emissions data
    fn score_table(&self, table: &Table) -> Option<f64> {
        let flattened = table.flattened_text();
        let hits = self.rules.keyword_score(&flattened);
        let labelled = table
            .header()
            .into_iter()
            .flatten()
            .map(String::as_str)
            .chain(table.first_column())
            .any(|cell| self.rules.mentions_scope(cell));

        if hits == 0.0 && !labelled {
            return None;
        }

        let numeric = if self.rules.has_plausible_number(&flattened) { 1.0 } else { 0.0 };
        Some(hits + numeric)
    }

    fn text_spans(&self, page_index: usize, lines: &[&str], window: Window) -> Vec<ClassifiedSpan> {
        let span = |start: usize, end: usize, text: String| ClassifiedSpan {
            kind: window.kind,
            page_index,
            location: SpanLocation::Lines { start, end },
            relevance_score: window.score,
            text,
        };

        let mut spans = Vec::new();
        let mut start = window.start;
        while start < window.end {
            let mut end = start + 1;
            while end < window.end
                && render_text(page_index, start, &lines[start..end + 1]).chars().count()
                    <= self.span_limit
            {
                end += 1;
            }

            let text = render_text(page_index, start, &lines[start..end]);
            if text.chars().count() > self.span_limit {
                spans.extend(
                    self.split_line(page_index, start, lines[start])
                        .into_iter()
                        .map(|piece| span(start, end, piece)),
                );
            } else if lines[start..end].iter().any(|line| !line.trim().is_empty()) {
                spans.push(span(start, end, text));
            }
            start = end;
        }

        spans
    }

    /// Cut one over-long line into pieces that fit the span limit
    fn split_line(&self, page_index: usize, line_index: usize, line: &str) -> Vec<String> {
        let marker_len = render_text(page_index, line_index, &[]).chars().count() + 1;
        let room = self.span_limit.saturating_sub(marker_len).max(1);
        let chars: Vec<char> = line.trim_end().chars().collect();

        chars
            .chunks(room)
            .map(|piece| {
                let piece: String = piece.iter().collect();
                render_text(page_index, line_index, &[piece.as_str()])
            })
            .collect()
    }
}

/// Merge overlapping or touching windows
fn merge(mut windows: Vec<Window>) -> Vec<Window> {
    windows.sort_by_key(|window| window.start);

    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => last.absorb(window),
            _ => merged.push(window),
        }
    }
    merged
}

/// Keep the first occurrence of each region
fn dedupe(regions: Vec<Region>) -> Vec<Region> {
    let mut kept: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        if !kept.iter().any(|seen| seen.span().same_region(region.span())) {
            kept.push(region);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SCOPE_WEIGHT;

    fn classifier(context_lines: usize, adjacent_pages: usize, span_limit: usize) -> Classifier {
        let config = ClassifierConfig {
            context_lines,
            adjacent_pages,
            ..ClassifierConfig::default()
        };
        Classifier::new(config, span_limit).unwrap()
    }

    fn numbered_lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("filler line {}", i)).collect()
    }

    #[test]
    fn test_scope_line_window_is_widened_and_clamped() {
        let mut lines = numbered_lines(40);
        lines[3] = "Scope 1 emissions were 12,345 tCO2e".to_string();
        let page = Page::new(1, lines.join("\n"), Vec::new());

        let spans = classifier(15, 1, 30_000).classify(&page);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::ScopeLine);
        assert_eq!(spans[0].location, SpanLocation::Lines { start: 0, end: 19 });
        assert!(spans[0].text.starts_with("=== TEXT ON PAGE 1 (lines 1-19) ==="));
    }

    #[test]
    fn test_overlapping_windows_merge() {
        let mut lines = numbered_lines(60);
        lines[10] = "Scope 1: 1,000".to_string();
        lines[20] = "Scope 2: 2,000".to_string();
        lines[50] = "Scope 3: 3,000".to_string();
        let page = Page::new(4, lines.join("\n"), Vec::new());

        let spans = classifier(5, 0, 30_000).classify(&page);
        let locations: Vec<_> = spans.iter().map(|span| span.location).collect();
        assert_eq!(
            locations,
            vec![
                SpanLocation::Lines { start: 5, end: 26 },
                SpanLocation::Lines { start: 45, end: 56 },
            ]
        );
        assert_eq!(spans[0].relevance_score, 2.0 * SCOPE_WEIGHT);
    }

    #[test]
    fn test_mentions_without_figures_are_ignored() {
        let page = Page::new(1, "Scope 1 covers direct emissions\nWe plan to report", Vec::new());
        assert!(classifier(15, 1, 30_000).classify(&page).is_empty());
    }

    #[test]
    fn test_section_heading_runs_to_next_heading() {
        let text = "Governance\n\
                    Greenhouse Gas Emissions\n\
                    our footprint fell again this year\n\
                    thanks to efficiency work\n\
                    Water Stewardship\n\
                    we withdrew less water";
        let page = Page::new(2, text, Vec::new());

        let spans = classifier(0, 0, 30_000).classify(&page);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::Narrative);
        assert_eq!(spans[0].location, SpanLocation::Lines { start: 1, end: 4 });
    }

    #[test]
    fn test_tables_scored_and_emitted_first() {
        let ghg = Table::new(vec![
            vec!["Metric".to_string(), "tCO2e".to_string()],
            vec!["Scope 1".to_string(), "12,345".to_string()],
        ]);
        let unrelated = Table::new(vec![
            vec!["Region".to_string(), "Staff".to_string()],
            vec!["EMEA".to_string(), "1,200".to_string()],
        ]);
        let page = Page::new(7, "Scope 2: 4,000", vec![unrelated, ghg]);

        let spans = classifier(0, 0, 30_000).classify(&page);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].location, SpanLocation::Table { ordinal: 2 });
        // "scope 1" + "tco2e" + plausible number
        assert_eq!(spans[0].relevance_score, 3.0);
        assert!(spans[0].text.starts_with("=== TABLE 2 ON PAGE 7 ==="));
        assert_eq!(spans[1].kind, SpanKind::ScopeLine);
    }

    #[test]
    fn test_adjacent_pages_become_context() {
        let pages = vec![
            Page::new(1, "Cover", Vec::new()),
            Page::new(2, "Our approach to climate", Vec::new()),
            Page::new(3, "Scope 1: 5,000 tCO2e", Vec::new()),
            Page::new(4, "", Vec::new()),
            Page::new(5, "Appendix", Vec::new()),
        ];

        let spans = classifier(0, 1, 30_000).classify_document(&pages);
        let summary: Vec<_> = spans
            .iter()
            .map(|span| (span.page_index, span.kind, span.relevance_score))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, SpanKind::Narrative, 0.0),
                (3, SpanKind::ScopeLine, SCOPE_WEIGHT),
            ]
        );
    }

    #[test]
    fn test_long_text_splits_at_line_boundaries() {
        let mut lines: Vec<String> = (0..30)
            .map(|i| format!("Scope 1 figure for site {} was 1,{:03} tonnes", i, i))
            .collect();
        lines.push(String::new());
        let page = Page::new(1, lines.join("\n"), Vec::new());

        let spans = classifier(0, 0, 300).classify(&page);
        assert!(spans.len() > 1);
        let mut expected_start = 0;
        for span in &spans {
            assert!(span.char_len() <= 300);
            match span.location {
                SpanLocation::Lines { start, end } => {
                    assert_eq!(start, expected_start);
                    expected_start = end;
                }
                SpanLocation::Table { .. } => panic!("unexpected table"),
            }
        }
        assert_eq!(expected_start, 30);
    }

    /// Span text without its location marker line
    fn body(span: &ClassifiedSpan) -> &str {
        span.text.split_once('\n').map_or("", |(_, rest)| rest)
    }

    #[test]
    fn test_split_text_keeps_every_line() {
        let lines: Vec<String> = (0..30)
            .map(|i| format!("Scope 1 figure for site {} was 1,{:03} tonnes", i, i))
            .collect();
        let page = Page::new(1, lines.join("\n"), Vec::new());

        let spans = classifier(0, 0, 300).classify(&page);
        let kept: Vec<&str> = spans.iter().flat_map(|span| body(span).lines()).collect();
        assert_eq!(kept, lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_giant_line_is_cut() {
        let line = format!("Scope 1: 9,999 {}", "x".repeat(500));
        let page = Page::new(1, line.clone(), Vec::new());

        let spans = classifier(0, 0, 120).classify(&page);
        assert!(spans.len() >= 5);
        assert!(spans.iter().all(|span| span.char_len() <= 120));

        let rejoined: String = spans.iter().map(body).collect();
        assert_eq!(rejoined, line);
    }

    #[test]
    fn test_identical_spans_emitted_once() {
        let page = Page::new(1, "Scope 1: 700", Vec::new());
        let spans = classifier(0, 0, 30_000).classify_document(&[page.clone(), page]);
        assert_eq!(spans.len(), 1);
    }
}
