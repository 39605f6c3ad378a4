//! Column type inference over a bounded row sample

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classifier::ValueClassifier;
use super::config::InferenceConfig;
use super::types::{ColumnExclusions, SemanticType};
use crate::schema::{SourceColumn, SourceSchema, naming};
use crate::source::{DelimitedOptions, DelimitedSource, Row, SourceError, TabularSource};

/// Statistics from one inference pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceStats {
    /// Data rows classified
    pub rows_sampled: usize,
    /// Data rows whose width differed from the first data row
    pub ragged_rows: usize,
    /// Whether the sample cap stopped the pass before end of data
    pub truncated: bool,
}

/// Result of an inference pass
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Header row, when the source has one
    pub header: Option<Row>,
    /// Final type per column
    pub types: Vec<SemanticType>,
    /// Exclusions per column at the end of the sample
    pub exclusions: Vec<ColumnExclusions>,
    /// First matching date pattern per `Date` column
    pub date_formats: Vec<Option<String>>,
    /// Pass statistics
    pub stats: InferenceStats,
}

/// Guesses a semantic type for every column of an untyped source
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeInferencer {
    config: InferenceConfig,
    classifier: ValueClassifier,
}

impl ColumnTypeInferencer {
    /// Create an inferencer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inferencer with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        let classifier = ValueClassifier::new(&config.classifier);
        Self { config, classifier }
    }

    /// Guess one type per column
    ///
    /// Only errors raised by the source propagate; classification itself
    /// cannot fail.
    pub fn guess_schema<S: TabularSource>(
        &self,
        source: S,
        has_header: bool,
    ) -> Result<Vec<SemanticType>, SourceError> {
        Ok(self.infer(source, has_header)?.types)
    }

    /// Run a full inference pass and keep its details
    pub fn infer<S: TabularSource>(
        &self,
        mut source: S,
        has_header: bool,
    ) -> Result<InferenceOutcome, SourceError> {
        let mut stats = InferenceStats::default();
        let first = source.next_row()?;

        let (header, mut row) = if has_header {
            (first, source.next_row()?)
        } else {
            (None, first)
        };

        let width = match (&row, &header) {
            (Some(data), _) => data.len(),
            (None, Some(names)) => names.len(),
            (None, None) => 0,
        };
        let mut exclusions = vec![ColumnExclusions::new(); width];
        let mut date_formats: Vec<Option<String>> = vec![None; width];

        while let Some(cells) = row.take() {
            if !self.config.allows_row(stats.rows_sampled) {
                stats.truncated = true;
                break;
            }
            stats.rows_sampled += 1;

            if cells.len() != width {
                stats.ragged_rows += 1;
                debug!(
                    row = stats.rows_sampled,
                    expected = width,
                    found = cells.len(),
                    "Ragged row in sample"
                );
            }

            // Cells past the established width are ignored; missing cells
            // leave their column unchanged.
            for ((value, excluded), date_format) in cells
                .iter()
                .zip(exclusions.iter_mut())
                .zip(date_formats.iter_mut())
            {
                self.observe(value, excluded, date_format);
            }

            row = source.next_row()?;
        }

        let types: Vec<SemanticType> = exclusions.iter().map(ColumnExclusions::resolve).collect();
        for (ty, date_format) in types.iter().zip(date_formats.iter_mut()) {
            if *ty != SemanticType::Date {
                *date_format = None;
            }
        }

        info!(
            columns = width,
            rows_sampled = stats.rows_sampled,
            ragged_rows = stats.ragged_rows,
            truncated = stats.truncated,
            "Column types inferred"
        );

        Ok(InferenceOutcome {
            header,
            types,
            exclusions,
            date_formats,
            stats,
        })
    }

    fn observe(
        &self,
        value: &str,
        excluded: &mut ColumnExclusions,
        date_format: &mut Option<String>,
    ) {
        excluded.mark_observed();

        if !excluded.is_excluded(SemanticType::Date) {
            match self.classifier.date_format(value) {
                Some(format) => {
                    if date_format.is_none() {
                        *date_format = Some(format.pattern().to_string());
                    }
                }
                None => excluded.exclude(SemanticType::Date),
            }
        }

        if !excluded.is_excluded(SemanticType::Fact) && !self.classifier.is_decimal(value) {
            excluded.exclude(SemanticType::Fact);
        }
    }

    /// Infer a [`SourceSchema`] named `name`
    ///
    /// Column names come from the header (sanitized to identifiers, the raw
    /// header kept as title) or are generated as `column_<n>`.
    pub fn guess_source_schema<S: TabularSource>(
        &self,
        name: &str,
        source: S,
        has_header: bool,
    ) -> Result<SourceSchema, SourceError> {
        let outcome = self.infer(source, has_header)?;
        Ok(outcome.into_schema(name))
    }

    /// Infer the schema of a delimited file
    pub fn guess_delimited_file(
        &self,
        path: &Path,
        options: DelimitedOptions,
        has_header: bool,
    ) -> Result<SourceSchema, SourceError> {
        let source = DelimitedSource::open(path, options)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(naming::format_short_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "source".to_string());
        self.guess_source_schema(&name, source, has_header)
    }
}

impl InferenceOutcome {
    /// Build a schema from the header and inferred types
    pub fn into_schema(self, name: &str) -> SourceSchema {
        let titles: Vec<String> = (0..self.types.len())
            .map(|i| {
                self.header
                    .as_ref()
                    .and_then(|h| h.get(i))
                    .map(|t| naming::format_long_name(t))
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("column_{}", i + 1))
            })
            .collect();
        let names = naming::unique_identifiers(&titles);

        let columns = names
            .into_iter()
            .zip(titles)
            .zip(self.types)
            .zip(self.date_formats)
            .map(|(((name, title), ty), date_format)| {
                let column = SourceColumn::new(name, ty, title);
                match date_format {
                    Some(format) => column.with_format(format),
                    None => column,
                }
            })
            .collect();

        SourceSchema::new(name, columns)
    }
}

/// [`ColumnTypeInferencer::guess_schema`] with default configuration
pub fn guess_schema<S: TabularSource>(
    source: S,
    has_header: bool,
) -> Result<Vec<SemanticType>, SourceError> {
    ColumnTypeInferencer::new().guess_schema(source, has_header)
}
