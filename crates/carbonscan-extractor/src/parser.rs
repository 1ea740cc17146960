//! Parse reasoning-service output into candidate results

use crate::error::ExtractionError;
use carbonscan_domain::{CandidateResult, ReportedPeriod, ReportedScope, ScopeCategory};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid code fence pattern")
});
static OUTER_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object pattern"));

/// Recover the JSON object from a response
///
/// Tried in order: the whole response, a fenced code block, the span from
/// the first `{` to the last `}`, then the first balanced `{...}` that
/// parses.
pub fn recover_json(response: &str) -> Result<Map<String, Value>, ExtractionError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let fenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str());
    let outer = OUTER_OBJECT.find(trimmed).map(|m| m.as_str());

    let attempts = std::iter::once(Some(trimmed))
        .chain([fenced, outer])
        .flatten();
    for candidate in attempts {
        if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate.trim()) {
            return Ok(object);
        }
    }

    first_balanced_object(trimmed).ok_or_else(|| {
        ExtractionError::MalformedResponse(format!(
            "no JSON object in response ({} chars)",
            trimmed.chars().count()
        ))
    })
}

/// Parse a response into a candidate for `chunk_index`
///
/// Accepts the nested shape (`current_year` / `previous_years` objects) and
/// a flat shape with scope keys at the top level. Values may be strings or
/// numbers. An object with no recognizable fields is a valid, empty
/// candidate.
pub fn parse_candidate(response: &str, chunk_index: usize) -> Result<CandidateResult, ExtractionError> {
    let object = recover_json(response)?;

    let nested = object.contains_key("current_year") || object.contains_key("previous_years");
    let current_year = if nested {
        object
            .get("current_year")
            .and_then(Value::as_object)
            .map(parse_period)
            .unwrap_or_default()
    } else {
        parse_flat_period(&object)
    };

    let previous_years = object
        .get("previous_years")
        .and_then(Value::as_array)
        .map(|periods| {
            periods
                .iter()
                .filter_map(Value::as_object)
                .map(parse_period)
                .collect()
        })
        .unwrap_or_default();

    let details = object.get("source_details").and_then(Value::as_object);
    let source_location = details
        .and_then(|d| text_field(d, "location"))
        .or_else(|| text_field(&object, "source_location"));
    let context = details
        .and_then(|d| text_field(d, "context"))
        .or_else(|| text_field(&object, "context"));

    Ok(CandidateResult {
        chunk_index,
        confidence: object.get("confidence").and_then(number_field),
        company: text_field(&object, "company"),
        sector: text_field(&object, "sector"),
        current_year,
        previous_years,
        source_location,
        context,
        page_indices: Default::default(),
    })
}

fn parse_period(object: &Map<String, Value>) -> ReportedPeriod {
    let scopes = ScopeCategory::ALL
        .into_iter()
        .filter_map(|category| {
            object
                .get(category.key())
                .and_then(parse_scope)
                .map(|scope| (category, scope))
        })
        .collect();

    ReportedPeriod {
        year: object.get("year").and_then(scalar_text),
        scopes,
    }
}

fn parse_flat_period(object: &Map<String, Value>) -> ReportedPeriod {
    let mut period = parse_period(object);
    if period.year.is_none() {
        period.year = object.get("reporting_year").and_then(scalar_text);
    }
    period
}

fn parse_scope(value: &Value) -> Option<ReportedScope> {
    match value {
        Value::Object(object) => Some(ReportedScope {
            value: object.get("value").and_then(scalar_text),
            unit: object.get("unit").and_then(scalar_text),
            year: object.get("year").and_then(scalar_text),
        }),
        Value::Null => None,
        other => scalar_text(other).map(|value| ReportedScope {
            value: Some(value),
            ..Default::default()
        }),
    }
}

/// A string or number as text; null, blank and placeholder strings are absent
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let placeholder = ["null", "none", "n/a", "na", "-", "not reported"]
        .iter()
        .any(|p| text.eq_ignore_ascii_case(p));
    (!text.is_empty() && !placeholder).then_some(text)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(|value| match value {
        Value::String(_) => scalar_text(value),
        _ => None,
    })
}

fn number_field(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Find the first `{...}` with balanced braces (ignoring braces inside
/// strings) that parses as an object
fn first_balanced_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &byte) in bytes[start..].iter().enumerate() {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match byte {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset + 1;
                        if let Ok(Value::Object(object)) = serde_json::from_str(&text[start..end]) {
                            return Some(object);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"{
        "company": "Acme Corp",
        "sector": "Manufacturing",
        "confidence": 0.85,
        "current_year": {
            "year": "2023",
            "scope_1": {"value": "12,345", "unit": "tCO2e"},
            "scope_2_market_based": {"value": 4200, "unit": "tCO2e", "year": 2023},
            "scope_2_location_based": null
        },
        "previous_years": [
            {"year": 2022, "scope_1": {"value": "13,001", "unit": "tCO2e"}}
        ],
        "source_details": {"location": "Page 14, Table 2", "context": "Scope 1 | 12,345"}
    }"#;

    #[test]
    fn test_parse_nested_shape() {
        let candidate = parse_candidate(NESTED, 3).unwrap();

        assert_eq!(candidate.chunk_index, 3);
        assert_eq!(candidate.company.as_deref(), Some("Acme Corp"));
        assert_eq!(candidate.confidence, Some(0.85));
        assert_eq!(candidate.current_year.year.as_deref(), Some("2023"));

        let scope_1 = &candidate.current_year.scopes[&ScopeCategory::Scope1];
        assert_eq!(scope_1.value.as_deref(), Some("12,345"));
        assert_eq!(scope_1.unit.as_deref(), Some("tCO2e"));

        let market = &candidate.current_year.scopes[&ScopeCategory::Scope2MarketBased];
        assert_eq!(market.value.as_deref(), Some("4200"));
        assert_eq!(market.year.as_deref(), Some("2023"));
        assert!(!candidate
            .current_year
            .scopes
            .contains_key(&ScopeCategory::Scope2LocationBased));

        assert_eq!(candidate.previous_years.len(), 1);
        assert_eq!(candidate.previous_years[0].year.as_deref(), Some("2022"));
        assert_eq!(candidate.source_location.as_deref(), Some("Page 14, Table 2"));
    }

    #[test]
    fn test_parse_flat_shape() {
        let response = r#"{"reporting_year": "FY2023", "scope_1": "1,200", "scope_2": {"value": 800}}"#;
        let candidate = parse_candidate(response, 0).unwrap();

        assert_eq!(candidate.current_year.year.as_deref(), Some("FY2023"));
        assert_eq!(
            candidate.current_year.scopes[&ScopeCategory::Scope1].value.as_deref(),
            Some("1,200")
        );
        assert_eq!(
            candidate.current_year.scopes[&ScopeCategory::Scope2].value.as_deref(),
            Some("800")
        );
        assert!(candidate.previous_years.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty_candidate() {
        let candidate = parse_candidate("{}", 1).unwrap();
        assert!(!candidate.has_data());
        assert_eq!(candidate.company, None);
    }

    #[test]
    fn test_placeholders_are_absent() {
        let response = r#"{"company": "N/A", "current_year": {"year": null, "scope_1": {"value": "null"}}}"#;
        let candidate = parse_candidate(response, 0).unwrap();
        assert_eq!(candidate.company, None);
        assert_eq!(candidate.current_year.year, None);
        assert!(!candidate.has_data());
    }

    #[test]
    fn test_recover_from_code_fence() {
        let response = "Here you go:\n```json\n{\"scope_1\": 5}\n```\nThanks";
        let object = recover_json(response).unwrap();
        assert_eq!(object["scope_1"], 5);
    }

    #[test]
    fn test_recover_from_surrounding_prose() {
        let response = "The figures are {\"scope_1\": 5} as shown.";
        assert_eq!(recover_json(response).unwrap()["scope_1"], 5);
    }

    #[test]
    fn test_recover_first_balanced_object() {
        let response = r#"First {"scope_1": "a}b"} then {"scope_2": 9} end"#;
        let object = recover_json(response).unwrap();
        assert_eq!(object["scope_1"], "a}b");
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(recover_json("  \n "), Err(ExtractionError::EmptyResponse));
    }

    #[test]
    fn test_no_object_is_malformed() {
        assert!(matches!(
            parse_candidate("I could not find any emissions data.", 0),
            Err(ExtractionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_candidate("[1, 2, 3]", 0),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_string_confidence() {
        let candidate = parse_candidate(r#"{"confidence": "0.4"}"#, 0).unwrap();
        assert_eq!(candidate.confidence, Some(0.4));
    }
}
