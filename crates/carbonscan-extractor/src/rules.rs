//! Versioned relevance rules
//!
//! Each rule maps a pattern to the span kind it opens and the weight it adds
//! to a span's relevance score. The fixed scope pattern comes first; keyword
//! and section rules are compiled from [`ClassifierConfig`].

use crate::config::ClassifierConfig;
use crate::error::ConfigError;
use carbonscan_domain::SpanKind;
use regex::Regex;
use std::sync::LazyLock;

/// Version of the built-in rule table
pub const RULESET_VERSION: &str = "2024.1";

/// Weight of a scope-line anchor
pub const SCOPE_WEIGHT: f64 = 2.0;

/// Weight of a keyword hit
pub const KEYWORD_WEIGHT: f64 = 1.0;

/// Weight of a section heading
pub const SECTION_WEIGHT: f64 = 1.0;

static SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)scope\s*[123]").expect("valid scope pattern"));
/// A scope mention with any enumerated siblings, e.g. `Scope 1, 2 and 3`
static SCOPE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)scope\s*[123](?:\s*(?:,|&|/|and|or)\s*[123])*")
        .expect("valid scope run pattern")
});
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid number pattern"));

/// One compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Source phrase or pattern
    pub name: String,
    /// Compiled matcher
    pub pattern: Regex,
    /// Span kind the rule contributes to
    pub kind: SpanKind,
    /// Score contribution
    pub weight: f64,
}

impl Rule {
    fn phrase(phrase: &str, kind: SpanKind, weight: f64) -> Result<Self, ConfigError> {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        let source = format!(r"(?i)\b{}\b", words.join(r"\s+"));
        let pattern = Regex::new(&source)
            .map_err(|e| ConfigError::Invalid(format!("rule '{}': {}", phrase, e)))?;
        Ok(Self {
            name: phrase.to_string(),
            pattern,
            kind,
            weight,
        })
    }
}

/// The compiled rule table used by the classifier
#[derive(Debug, Clone)]
pub struct RuleSet {
    scope: Rule,
    keywords: Vec<Rule>,
    sections: Vec<Rule>,
    min_plausible: f64,
    max_plausible: f64,
}

impl RuleSet {
    /// Compile the rule table for a classifier configuration
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let compile = |phrases: &[String], kind: SpanKind, weight: f64| {
            phrases
                .iter()
                .filter(|phrase| !phrase.trim().is_empty())
                .map(|phrase| Rule::phrase(phrase, kind, weight))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            scope: Rule {
                name: "scope line".to_string(),
                pattern: SCOPE.clone(),
                kind: SpanKind::ScopeLine,
                weight: SCOPE_WEIGHT,
            },
            keywords: compile(&config.keywords, SpanKind::Table, KEYWORD_WEIGHT)?,
            sections: compile(&config.section_phrases, SpanKind::Narrative, SECTION_WEIGHT)?,
            min_plausible: config.min_plausible_value,
            max_plausible: config.max_plausible_value,
        })
    }

    /// Rule table version
    pub fn version(&self) -> &'static str {
        RULESET_VERSION
    }

    /// Every rule, in priority order: scope, keywords, sections
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        std::iter::once(&self.scope)
            .chain(&self.keywords)
            .chain(&self.sections)
    }

    /// Whether `text` names a scope (`scope 1`, `Scope2`, ...)
    pub fn mentions_scope(&self, text: &str) -> bool {
        SCOPE.is_match(text)
    }

    /// Whether a line anchors a scope-line span: a scope mention plus a
    /// number that is not one of the scope digits
    pub fn is_scope_line(&self, line: &str) -> bool {
        self.scope.pattern.is_match(line) && NUMBER.is_match(&SCOPE_RUN.replace_all(line, " "))
    }

    /// The scope rule, if `line` anchors a scope-line span
    pub fn scope_rule(&self, line: &str) -> Option<&Rule> {
        self.is_scope_line(line).then_some(&self.scope)
    }

    /// Whether a line contains a target section phrase
    pub fn is_section_heading(&self, line: &str) -> bool {
        self.section_rule(line).is_some()
    }

    /// The first section rule matching `line`
    pub fn section_rule(&self, line: &str) -> Option<&Rule> {
        self.sections.iter().find(|rule| rule.pattern.is_match(line))
    }

    /// Number of distinct keywords found in `text`
    pub fn keyword_hits(&self, text: &str) -> usize {
        self.matching_keywords(text).count()
    }

    /// Summed weight of the distinct keywords found in `text`
    pub fn keyword_score(&self, text: &str) -> f64 {
        self.matching_keywords(text).map(|rule| rule.weight).sum()
    }

    fn matching_keywords<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.keywords
            .iter()
            .filter(move |rule| rule.pattern.is_match(text))
    }

    /// Whether `text` holds a number in the plausible emissions range
    pub fn has_plausible_number(&self, text: &str) -> bool {
        NUMBER
            .find_iter(text)
            .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
            .any(|value| value >= self.min_plausible && value <= self.max_plausible)
    }

    /// Whether a line looks like a heading: short, capitalized, free of
    /// digits and without trailing punctuation
    pub fn is_heading_like(&self, line: &str) -> bool {
        let line = line.trim();
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        let ends_clean = !line.ends_with(['.', ',', ';', ':', '|']);

        starts_upper
            && ends_clean
            && line.chars().count() <= 60
            && line.split_whitespace().count() <= 8
            && !line.chars().any(|c| c.is_ascii_digit())
    }
}
