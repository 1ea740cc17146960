//! Configuration for the Segmenter

use serde::{Deserialize, Serialize};

/// Configuration for the Segmenter
///
/// # Examples
///
/// ```
/// use carbonscan_segmenter::SegmenterConfig;
///
/// let config = SegmenterConfig::default();
/// assert_eq!(config.line_tolerance, 3.0);
/// assert_eq!(config.min_table_rows, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Vertical distance within which words belong to the same line
    /// Default: 3.0 (page units)
    pub line_tolerance: f32,

    /// Fewest rows a table needs to be kept
    /// Default: 2
    pub min_table_rows: usize,

    /// Fewest cells a text line needs to count as a table row
    /// Default: 2
    pub min_table_columns: usize,

    /// Run the text-layout table detector on sources without native tables
    /// Default: true
    #[serde(default = "default_detect_text_tables")]
    pub detect_text_tables: bool,
}

fn default_detect_text_tables() -> bool {
    true
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            min_table_rows: 2,
            min_table_columns: 2,
            detect_text_tables: true,
        }
    }
}

impl SegmenterConfig {
    /// Aggressive preset: only clearly structured tables
    pub fn aggressive() -> Self {
        Self {
            line_tolerance: 2.0,
            min_table_rows: 3,
            min_table_columns: 3,
            detect_text_tables: true,
        }
    }

    /// Lenient preset: loose line grouping, any two-row grid counts
    pub fn lenient() -> Self {
        Self {
            line_tolerance: 5.0,
            min_table_rows: 2,
            min_table_columns: 2,
            detect_text_tables: true,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err("line_tolerance must be a non-negative number".to_string());
        }
        if self.min_table_rows < 2 {
            return Err("min_table_rows must be at least 2".to_string());
        }
        if self.min_table_columns < 2 {
            return Err("min_table_columns must be at least 2".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
