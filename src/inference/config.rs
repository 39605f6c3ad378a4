//! Configuration for value classification and schema inference

use serde::{Deserialize, Serialize};

/// Date patterns tried by the classifier, in order
pub const DEFAULT_DATE_FORMATS: [&str; 6] = [
    "yyyy-MM-dd",
    "MM/dd/yyyy",
    "M/d/yyyy",
    "MM-dd-yyyy",
    "yyyy-M-d",
    "M-d-yyyy",
];

/// Characters removed from a value before it is tested as a decimal
///
/// Covers quoting, whitespace, sign and separator punctuation, and common
/// currency symbols.
pub const DEFAULT_DISCARD_CHARS: [char; 29] = [
    '"', ' ', '!', '?', '%', '&', '#', '*', '+', '-', '=', '/', ',', '.', '>', '<', '$', '(', ')',
    '€', '£', '¥', '@', '{', '}', '[', ']', '\\', ':',
];

/// Default number of data rows sampled per inference pass
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Immutable format tables used by the value classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Date patterns (`yyyy`, `yy`, `MM`, `M`, `dd`, `d` plus literal separators)
    pub date_formats: Vec<String>,
    /// Characters stripped before decimal parsing
    pub discard_chars: Vec<char>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            discard_chars: DEFAULT_DISCARD_CHARS.to_vec(),
        }
    }
}

/// Configuration for column type inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum number of data rows to sample (0 = all rows)
    pub sample_size: usize,

    /// Format tables for the classifier
    pub classifier: ClassifierConfig,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }

    /// Whether another row may be sampled after `sampled` rows
    pub fn allows_row(&self, sampled: usize) -> bool {
        self.sample_size == 0 || sampled < self.sample_size
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the sample size (0 = all rows)
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Replace the date patterns
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.classifier.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the discard characters
    pub fn discard_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.config.classifier.discard_chars = chars.into_iter().collect();
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.sample_size, 1000);
        assert_eq!(config.classifier.date_formats.len(), 6);
        assert_eq!(config.classifier.date_formats[0], "yyyy-MM-dd");
        assert!(config.classifier.discard_chars.contains(&'$'));
    }

    #[test]
    fn test_builder() {
        let config = InferenceConfig::builder()
            .sample_size(50)
            .date_formats(["dd.MM.yyyy"])
            .discard_chars([' ', '\''])
            .build();

        assert_eq!(config.sample_size, 50);
        assert_eq!(config.classifier.date_formats, vec!["dd.MM.yyyy"]);
        assert_eq!(config.classifier.discard_chars, vec![' ', '\'']);
    }

    #[test]
    fn test_allows_row() {
        let capped = InferenceConfig::builder().sample_size(2).build();
        assert!(capped.allows_row(1));
        assert!(!capped.allows_row(2));

        let unbounded = InferenceConfig::builder().sample_size(0).build();
        assert!(unbounded.allows_row(1_000_000));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: InferenceConfig = serde_json::from_str(r#"{"sample_size": 10}"#).unwrap();
        assert_eq!(config.sample_size, 10);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }
}
