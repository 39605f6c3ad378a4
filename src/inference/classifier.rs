//! Single-value classification: integer, decimal and date tests
//!
//! Every test is total. Malformed input is data, not an error, so the
//! functions here answer `false` instead of failing.

use chrono::NaiveDate;
use once_cell::sync::Lazy;

use super::config::ClassifierConfig;

/// A date pattern compiled to its strftime equivalent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    strftime: String,
}

impl DateFormat {
    /// Compile a `yyyy-MM-dd` style pattern
    ///
    /// `yyyy`/`yy` are years, `MM`/`dd` zero-padded month/day, `M`/`d`
    /// unpadded month/day. Any other character is a literal.
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            strftime: to_strftime(pattern),
        }
    }

    /// The original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The strftime string used with chrono
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Parse `value` and accept it only if formatting it back reproduces it
    pub fn matches(&self, value: &str) -> bool {
        match NaiveDate::parse_from_str(value, &self.strftime) {
            Ok(date) => self.format(date) == value,
            Err(_) => false,
        }
    }

    /// Format a date with this pattern
    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.strftime).to_string()
    }
}

fn to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match (c, run) {
            ('y', n) if n >= 3 => out.push_str("%Y"),
            ('y', _) => out.push_str("%y"),
            ('M', 1) => out.push_str("%-m"),
            ('M', _) => out.push_str("%m"),
            ('d', 1) => out.push_str("%-d"),
            ('d', _) => out.push_str("%d"),
            ('%', n) => {
                for _ in 0..n {
                    out.push_str("%%");
                }
            }
            (other, n) => {
                for _ in 0..n {
                    out.push(other);
                }
            }
        }
        i += run;
    }

    out
}

/// Classifies single string values against fixed format tables
#[derive(Debug, Clone)]
pub struct ValueClassifier {
    date_formats: Vec<DateFormat>,
    discard_chars: Vec<char>,
}

impl Default for ValueClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl ValueClassifier {
    /// Build a classifier from its configuration
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            date_formats: config.date_formats.iter().map(|p| DateFormat::new(p)).collect(),
            discard_chars: config.discard_chars.clone(),
        }
    }

    /// Compiled date formats, in trial order
    pub fn date_formats(&self) -> &[DateFormat] {
        &self.date_formats
    }

    /// True iff the trimmed value is a base-10 signed 32-bit integer
    pub fn is_integer(&self, value: &str) -> bool {
        value.trim().parse::<i32>().is_ok()
    }

    /// True iff the value parses as a finite number once noise is stripped
    ///
    /// Stripping is lossy: `"$1,200.50"` becomes `"120050"`, and a value
    /// made only of noise becomes empty, which is not a decimal.
    pub fn is_decimal(&self, value: &str) -> bool {
        let stripped: String = value
            .chars()
            .filter(|c| !self.discard_chars.contains(c))
            .collect();
        let stripped = stripped.trim();
        if stripped.is_empty() {
            return false;
        }
        stripped.parse::<f64>().is_ok_and(f64::is_finite)
    }

    /// True iff some date format round-trips the value
    pub fn is_date(&self, value: &str) -> bool {
        self.date_format(value).is_some()
    }

    /// The first date format that round-trips the value
    pub fn date_format(&self, value: &str) -> Option<&DateFormat> {
        self.date_formats.iter().find(|f| f.matches(value))
    }
}

static DEFAULT_CLASSIFIER: Lazy<ValueClassifier> = Lazy::new(ValueClassifier::default);

/// [`ValueClassifier::is_integer`] with the default tables
pub fn is_integer(value: &str) -> bool {
    DEFAULT_CLASSIFIER.is_integer(value)
}

/// [`ValueClassifier::is_decimal`] with the default tables
pub fn is_decimal(value: &str) -> bool {
    DEFAULT_CLASSIFIER.is_decimal(value)
}

/// [`ValueClassifier::is_date`] with the default tables
pub fn is_date(value: &str) -> bool {
    DEFAULT_CLASSIFIER.is_date(value)
}
