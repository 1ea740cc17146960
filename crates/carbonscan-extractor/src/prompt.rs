//! Prompt construction for emissions extraction

use crate::types::CompanyContext;

/// JSON shape the reasoning service is asked to return
pub const OUTPUT_SCHEMA: &str = r#"{
  "company": "string or null",
  "sector": "string or null",
  "confidence": "number between 0 and 1",
  "current_year": {
    "year": "YYYY",
    "scope_1": {"value": "number or null", "unit": "string", "year": "YYYY or null"},
    "scope_2": {"value": "number or null", "unit": "string", "year": "YYYY or null"},
    "scope_2_market_based": {"value": "number or null", "unit": "string", "year": "YYYY or null"},
    "scope_2_location_based": {"value": "number or null", "unit": "string", "year": "YYYY or null"}
  },
  "previous_years": [
    {
      "year": "YYYY",
      "scope_1": {"value": "number or null", "unit": "string"},
      "scope_2_market_based": {"value": "number or null", "unit": "string"},
      "scope_2_location_based": {"value": "number or null", "unit": "string"}
    }
  ],
  "source_details": {
    "location": "page, table or section where the figures appear",
    "context": "short quote around the figures"
  }
}"#;

/// Builds the extraction prompt for one chunk
pub struct PromptBuilder<'a> {
    text: &'a str,
    context: &'a CompanyContext,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for a chunk's serialized text
    pub fn new(text: &'a str, context: &'a CompanyContext) -> Self {
        Self { text, context }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        match &self.context.name {
            Some(name) => prompt.push_str(&format!(
                "Analyze this excerpt of a sustainability report for {}.\n\n",
                name
            )),
            None => prompt.push_str("Analyze this excerpt of a sustainability report.\n\n"),
        }

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        if let Some(year) = self.context.year_hint {
            prompt.push_str(&format!(
                "The report is believed to cover {}. Prefer figures for that year as the current year.\n\n",
                year
            ));
        }

        prompt.push_str("Report excerpt:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt.push('\n');
        prompt.push_str(OUTPUT_SCHEMA);

        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract greenhouse gas emissions figures:
1. The most recent Scope 1 and Scope 2 emissions, with the year they refer to
2. Whether each Scope 2 figure is market-based or location-based; use scope_2 when the method is not stated
3. The same figures for up to two earlier years
4. Where the figures appear and the sentence or row around them

Rules:
- Report values exactly as written, including thousands separators
- Report the unit exactly as written (e.g. "tCO2e", "metric tons CO2e")
- Use null for anything the excerpt does not state; never estimate
- Do not add Scope 1 and Scope 2 together unless the excerpt does
- Rows labelled TOTAL are totals of the rows above them
- Set confidence lower when the figures are ambiguous or the year is unclear"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Return ONLY a JSON object with this structure, no markdown and no explanations:";
