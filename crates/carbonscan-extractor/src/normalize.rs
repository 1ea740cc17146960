//! Value, unit and year normalization
//!
//! Units are relabelled to [`CANONICAL_UNIT`], never converted: a figure
//! reported in "kt CO2e" keeps its number.

use carbonscan_domain::{
    EmissionYear, ReportedPeriod, ReportedScope, ScopeCategory, ScopeEmission, CANONICAL_UNIT,
};
use regex::Regex;
use std::sync::LazyLock;

/// Earliest accepted reporting year
pub const MIN_YEAR: i32 = 2000;

/// Latest accepted reporting year
pub const MAX_YEAR: i32 = 2100;

static EMBEDDED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").expect("valid year pattern"));

/// Parse a reported value: thousands separators and spaces are stripped
pub fn parse_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// The canonical unit label, whatever was reported
pub fn canonical_unit(_reported: Option<&str>) -> &'static str {
    CANONICAL_UNIT
}

/// Parse a reported year into [`MIN_YEAR`, `MAX_YEAR`]
///
/// Accepts integers, whole floats (`2023.0`) and strings with one embedded
/// four-digit year (`FY2023`, `2023 (calendar)`).
pub fn normalize_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();

    let year = match raw.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < 1e6 => value as i64,
        Ok(_) => return None,
        Err(_) => EMBEDDED_YEAR
            .captures(raw)
            .and_then(|captures| captures[1].parse::<i64>().ok())?,
    };

    (i64::from(MIN_YEAR)..=i64::from(MAX_YEAR))
        .contains(&year)
        .then_some(year as i32)
}

/// Normalize one scope figure; a scope without its own year inherits
/// `period_year`
pub fn normalize_scope(scope: &ReportedScope, period_year: Option<i32>) -> ScopeEmission {
    let year = match scope.year.as_deref() {
        Some(raw) => normalize_year(raw),
        None => period_year,
    };

    ScopeEmission {
        value: scope.value.as_deref().and_then(parse_value),
        unit: canonical_unit(scope.unit.as_deref()).to_string(),
        year,
    }
}

/// Normalize a reporting period; every category is present in the output
pub fn normalize_period(period: &ReportedPeriod) -> EmissionYear {
    let year = period.year.as_deref().and_then(normalize_year);

    let scopes = ScopeCategory::ALL
        .into_iter()
        .map(|category| {
            let emission = period
                .scopes
                .get(&category)
                .map(|scope| normalize_scope(scope, year))
                .unwrap_or_else(ScopeEmission::empty);
            (category, emission)
        })
        .collect();

    EmissionYear { year, scopes }
}
