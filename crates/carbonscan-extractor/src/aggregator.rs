//! Merging per-chunk candidates into one emissions record
//!
//! Merge rules:
//!
//! - **Baseline**: the candidate with a Scope 1 value and the highest
//!   confidence supplies the current year (ties go to the lowest chunk
//!   index). Without any Scope 1 value, the first candidate with any figure
//!   is used, then the first candidate.
//! - **Previous years**: every candidate's previous periods, plus other
//!   candidates' current periods for a different year, pooled and
//!   deduplicated by year. Higher confidence wins; ties keep the first seen.
//!   Periods without a year, for the baseline year, or without any figure
//!   are dropped. Newest first.
//! - **Sector / company**: first non-null in chunk order.
//! - **Locations / contexts / pages**: from candidates that carried any
//!   figure, deduplicated in order.

use crate::error::AggregationError;
use crate::normalize::normalize_period;
use carbonscan_domain::{
    CandidateResult, EmissionRecord, EmissionYear, RecordId, ScopeCategory,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Merge candidates into a record
///
/// The record's `source_url`, `report_year` and `warnings` are left for
/// the caller to fill in.
pub fn aggregate(mut candidates: Vec<CandidateResult>) -> Result<EmissionRecord, AggregationError> {
    if candidates.is_empty() {
        return Err(AggregationError::NoCandidates);
    }
    candidates.sort_by_key(|candidate| candidate.chunk_index);

    let normalized: Vec<Normalized> = candidates
        .iter()
        .map(|candidate| Normalized {
            confidence: candidate.confidence.unwrap_or(f64::NEG_INFINITY),
            current: normalize_period(&candidate.current_year),
            previous: candidate.previous_years.iter().map(normalize_period).collect(),
        })
        .collect();

    let baseline = select_baseline(&normalized);
    let current_year = normalized[baseline].current.clone();
    let previous_years = merge_previous(&normalized, baseline, current_year.year);

    let contributing: Vec<&CandidateResult> =
        candidates.iter().filter(|candidate| candidate.has_data()).collect();

    let record = EmissionRecord {
        id: RecordId::new(),
        company: first_present(candidates.iter().map(|c| c.company.as_ref())),
        sector: first_present(candidates.iter().map(|c| c.sector.as_ref())),
        source_url: None,
        report_year: None,
        current_year,
        previous_years,
        source_locations: dedupe_in_order(
            contributing.iter().copied().filter_map(|c| c.source_location.as_ref()),
        ),
        contexts: dedupe_in_order(
            contributing.iter().copied().filter_map(|c| c.context.as_ref()),
        ),
        cited_pages: contributing
            .iter()
            .copied()
            .flat_map(|c| c.page_indices.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        warnings: Vec::new(),
    };

    debug!(
        "Aggregated {} candidates (baseline chunk {}, {} previous years)",
        candidates.len(),
        candidates[baseline].chunk_index,
        record.previous_years.len()
    );
    Ok(record)
}

struct Normalized {
    confidence: f64,
    current: EmissionYear,
    previous: Vec<EmissionYear>,
}

fn select_baseline(candidates: &[Normalized]) -> usize {
    let mut best: Option<usize> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.current.value(ScopeCategory::Scope1).is_none() {
            continue;
        }
        match best {
            Some(b) if candidates[b].confidence >= candidate.confidence => {}
            _ => best = Some(i),
        }
    }

    best.or_else(|| candidates.iter().position(|c| c.current.has_values()))
        .unwrap_or(0)
}

fn merge_previous(
    candidates: &[Normalized],
    baseline: usize,
    baseline_year: Option<i32>,
) -> Vec<EmissionYear> {
    let mut by_year: BTreeMap<i32, (f64, EmissionYear)> = BTreeMap::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let own_current = (i != baseline).then_some(&candidate.current);
        for period in own_current.into_iter().chain(&candidate.previous) {
            let Some(year) = period.year else { continue };
            if Some(year) == baseline_year || !period.has_values() {
                continue;
            }

            match by_year.get(&year) {
                Some((confidence, _)) if *confidence >= candidate.confidence => {}
                _ => {
                    by_year.insert(year, (candidate.confidence, period.clone()));
                }
            }
        }
    }

    by_year.into_values().rev().map(|(_, period)| period).collect()
}

fn first_present<'a>(mut values: impl Iterator<Item = Option<&'a String>>) -> Option<String> {
    values.find_map(|value| value.cloned())
}

fn dedupe_in_order<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|&value| seen.insert(value.as_str()))
        .cloned()
        .collect()
}
