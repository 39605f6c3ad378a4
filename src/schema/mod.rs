//! Source column schemas and their config files
//!
//! A [`SourceSchema`] records one `(name, semantic type, title)` entry per
//! column. It is produced once per source, either from declared source
//! types or from sampling inference, and handed to downstream loaders next
//! to the extracted rows. Schemas are stored as JSON, or YAML when the file
//! extension says so.

pub mod naming;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inference::SemanticType;

/// Errors reading or writing schema config files
#[derive(Error, Debug)]
pub enum SchemaError {
    /// IO error with path context
    #[error("IO error with {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Structurally invalid schema
    #[error("Invalid schema: {0}")]
    Invalid(String),
}

impl SchemaError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            SchemaError::Io { path, source } => format!(
                "Cannot access schema file {}: {source}\n\nHint: Check the path and permissions.",
                path.display()
            ),
            SchemaError::Invalid(msg) => format!(
                "Invalid schema: {msg}\n\nHint: Every column needs a unique, non-empty name."
            ),
            _ => self.to_string(),
        }
    }
}

/// One column of a source schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceColumn {
    /// Identifier used downstream
    pub name: String,
    /// Semantic type
    pub ldm_type: SemanticType,
    /// Human-readable title (usually the raw source column name)
    pub title: String,
    /// Date pattern for `DATE` columns, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl SourceColumn {
    /// Create a column
    pub fn new(name: impl Into<String>, ldm_type: SemanticType, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ldm_type,
            title: title.into(),
            format: None,
        }
    }

    /// Attach a date pattern
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Column schema of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSchema {
    name: String,
    columns: Vec<SourceColumn>,
}

impl SourceSchema {
    /// Create a schema
    pub fn new(name: impl Into<String>, columns: Vec<SourceColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Create a schema from raw source titles, deriving unique identifiers
    pub fn from_titles<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (S, SemanticType)>,
        S: AsRef<str>,
    {
        let (titles, types): (Vec<String>, Vec<SemanticType>) = columns
            .into_iter()
            .map(|(title, ty)| (naming::format_long_name(title.as_ref()), ty))
            .unzip();
        let names = naming::unique_identifiers(&titles);
        let columns = names
            .into_iter()
            .zip(titles)
            .zip(types)
            .map(|((name, title), ty)| SourceColumn::new(name, ty, title))
            .collect();
        Self::new(name, columns)
    }

    /// The same columns under another name
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: self.columns,
        }
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in source order
    pub fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    /// Semantic type per column
    pub fn types(&self) -> Vec<SemanticType> {
        self.columns.iter().map(|c| c.ldm_type).collect()
    }

    /// Look up a column by identifier
    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check names are present and unique
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for (i, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(SchemaError::Invalid(format!("column {} has no name", i + 1)));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::Invalid(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Read a schema config file
    pub fn read_config(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: SourceSchema = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Write this schema as a config file
    pub fn write_config(&self, path: &Path) -> Result<(), SchemaError> {
        self.validate()?;
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
