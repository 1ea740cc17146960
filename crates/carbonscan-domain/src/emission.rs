//! Emission figures: raw candidates from the reasoning service and the
//! normalized record produced by aggregation

use crate::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The single unit label every normalized figure carries
///
/// Units are relabelled, never converted.
pub const CANONICAL_UNIT: &str = "metric tons CO2e";

/// Emissions category a figure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScopeCategory {
    /// Direct emissions
    #[serde(rename = "scope_1")]
    Scope1,
    /// Indirect (purchased energy) emissions, accounting method not stated
    #[serde(rename = "scope_2")]
    Scope2,
    /// Scope 2 under the market-based method
    #[serde(rename = "scope_2_market_based")]
    Scope2MarketBased,
    /// Scope 2 under the location-based method
    #[serde(rename = "scope_2_location_based")]
    Scope2LocationBased,
}

impl ScopeCategory {
    /// Every category, in schema order
    pub const ALL: [ScopeCategory; 4] = [
        ScopeCategory::Scope1,
        ScopeCategory::Scope2,
        ScopeCategory::Scope2MarketBased,
        ScopeCategory::Scope2LocationBased,
    ];

    /// Key used in the structured payload
    pub fn key(&self) -> &'static str {
        match self {
            ScopeCategory::Scope1 => "scope_1",
            ScopeCategory::Scope2 => "scope_2",
            ScopeCategory::Scope2MarketBased => "scope_2_market_based",
            ScopeCategory::Scope2LocationBased => "scope_2_location_based",
        }
    }

    /// Look a category up by payload key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }
}

impl fmt::Display for ScopeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One scope figure exactly as the reasoning service reported it
///
/// Numbers arrive as strings ("12,345") or JSON numbers; both are kept as text
/// until normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportedScope {
    /// Reported value, unparsed
    pub value: Option<String>,
    /// Reported unit phrase
    pub unit: Option<String>,
    /// Reported year for this figure, unparsed
    pub year: Option<String>,
}

impl ReportedScope {
    /// Whether a value was reported at all
    pub fn has_value(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }
}

/// A reporting period as the reasoning service described it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportedPeriod {
    /// Period year, unparsed
    pub year: Option<String>,
    /// Figures by category
    pub scopes: BTreeMap<ScopeCategory, ReportedScope>,
}

impl ReportedPeriod {
    /// Whether any scope in the period carries a value
    pub fn has_values(&self) -> bool {
        self.scopes.values().any(ReportedScope::has_value)
    }
}

/// One chunk's structured answer before cross-chunk merging
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateResult {
    /// Index of the chunk this came from (stable tie-breaker)
    pub chunk_index: usize,

    /// Self-reported confidence, when the service provides one
    pub confidence: Option<f64>,

    /// Company name as reported
    pub company: Option<String>,

    /// Industry sector as reported
    pub sector: Option<String>,

    /// Most recent reporting period
    pub current_year: ReportedPeriod,

    /// Earlier reporting periods
    pub previous_years: Vec<ReportedPeriod>,

    /// Where in the document the figures were found
    pub source_location: Option<String>,

    /// Surrounding context quoted by the service
    pub context: Option<String>,

    /// Pages the originating chunk covered
    pub page_indices: BTreeSet<usize>,
}

impl CandidateResult {
    /// Whether the candidate carries any figure at all
    pub fn has_data(&self) -> bool {
        self.current_year.has_values() || self.previous_years.iter().any(ReportedPeriod::has_values)
    }
}

/// A normalized scope figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeEmission {
    /// Numeric value, null when missing or unparseable
    pub value: Option<f64>,
    /// Always [`CANONICAL_UNIT`]
    pub unit: String,
    /// Reporting year within [2000, 2100], else null
    pub year: Option<i32>,
}

impl ScopeEmission {
    /// A figure with no value and no year
    pub fn empty() -> Self {
        Self {
            value: None,
            unit: CANONICAL_UNIT.to_string(),
            year: None,
        }
    }
}

/// A normalized reporting period
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmissionYear {
    /// Period year within [2000, 2100], else null
    pub year: Option<i32>,
    /// Figures by category
    pub scopes: BTreeMap<ScopeCategory, ScopeEmission>,
}

impl EmissionYear {
    /// Figure for a category, if present
    pub fn scope(&self, category: ScopeCategory) -> Option<&ScopeEmission> {
        self.scopes.get(&category)
    }

    /// Value for a category, if present and parsed
    pub fn value(&self, category: ScopeCategory) -> Option<f64> {
        self.scope(category).and_then(|scope| scope.value)
    }

    /// Whether any figure carries a value
    pub fn has_values(&self) -> bool {
        self.scopes.values().any(|scope| scope.value.is_some())
    }
}

/// The merged output for one processed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    /// Identifier for downstream persistence
    pub id: RecordId,

    /// Company the record describes
    pub company: Option<String>,

    /// Industry sector (first reported value wins)
    pub sector: Option<String>,

    /// URL of the source document
    pub source_url: Option<String>,

    /// Reporting-year hint from discovery
    pub report_year: Option<i32>,

    /// Most recent reporting period
    pub current_year: EmissionYear,

    /// Earlier periods, one per year, newest first
    pub previous_years: Vec<EmissionYear>,

    /// Where figures were found, deduplicated in order of appearance
    pub source_locations: Vec<String>,

    /// Quoted context, deduplicated in order of appearance
    pub contexts: Vec<String>,

    /// Pages covered by contributing chunks, ascending
    pub cited_pages: Vec<usize>,

    /// Non-fatal problems met while producing the record
    pub warnings: Vec<String>,
}

impl EmissionRecord {
    /// Whether any figure, current or previous, has a value
    pub fn has_data(&self) -> bool {
        self.current_year.has_values() || self.previous_years.iter().any(EmissionYear::has_values)
    }
}
