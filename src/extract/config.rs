//! Extraction configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::connector::{Connector, DelimitedConnector};
use super::loader::{FileLoader, Loader};
use crate::inference::InferenceConfig;
use crate::source::DelimitedOptions;

/// Errors loading an extraction configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Cannot parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Config parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Parse { path, message } => format!(
                "Cannot parse {}: {message}\n\n\
                Hint: Config files may be TOML, JSON or YAML, chosen by file extension.",
                path.display()
            ),
            ConfigError::Invalid(msg) => format!(
                "Invalid configuration: {msg}\n\n\
                Hint: A source needs `kind = \"delimited\"` with a `path`, or `kind = \"duckdb\"` with a `url` and `query`."
            ),
            _ => self.to_string(),
        }
    }
}

/// Where rows are extracted from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Delimited text file
    Delimited {
        path: PathBuf,
        #[serde(default = "default_true")]
        has_header: bool,
        #[serde(default)]
        options: DelimitedOptions,
    },
    /// Query against a DuckDB database
    Duckdb {
        url: String,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        password: Option<String>,
        query: String,
    },
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    /// Label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Delimited { .. } => "delimited",
            SourceConfig::Duckdb { .. } => "duckdb",
        }
    }
}

/// Where a finished extraction is loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetConfig {
    /// Delimited output file
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        header: bool,
    },
    /// Table in a DuckDB staging database
    Staging { database: String, table: String },
}

/// Configuration for one extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Schema name (defaults to a name derived from the source)
    #[serde(default)]
    pub name: Option<String>,
    /// Source to extract from
    pub source: SourceConfig,
    /// Optional load target
    #[serde(default)]
    pub target: Option<TargetConfig>,
    /// Inference settings for untyped sources
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Directory for sink files (system temp dir when unset)
    #[serde(default)]
    pub sink_dir: Option<PathBuf>,
    /// Schema file that replaces declared or inferred types
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
}

impl ExtractConfig {
    /// Create a config for `source`
    pub fn new(source: SourceConfig) -> Self {
        Self {
            name: None,
            source,
            target: None,
            inference: InferenceConfig::default(),
            sink_dir: None,
            schema_file: None,
        }
    }

    /// Read a TOML, JSON or YAML config file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let config: ExtractConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Set the schema name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the load target
    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the sink directory
    pub fn with_sink_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sink_dir = Some(dir.into());
        self
    }

    /// Use a schema file instead of declared or inferred types
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match &self.source {
            SourceConfig::Delimited { path, options, .. } => {
                if path.as_os_str().is_empty() {
                    return Err("Delimited source requires a path".to_string());
                }
                options.validate()?;
            }
            SourceConfig::Duckdb { url, query, .. } => {
                if url.trim().is_empty() {
                    return Err("DuckDB source requires a url".to_string());
                }
                if query.trim().is_empty() {
                    return Err("DuckDB source requires a query".to_string());
                }
            }
        }

        if let Some(TargetConfig::Staging { table, .. }) = &self.target
            && crate::schema::naming::format_short_name(table).is_empty()
        {
            return Err(format!("Staging table name '{table}' is not a valid identifier"));
        }

        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("Name must not be empty".to_string());
        }

        Ok(())
    }

    /// Schema name: the configured name or one derived from the source
    pub fn schema_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.source {
            SourceConfig::Delimited { path, .. } => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(crate::schema::naming::format_short_name)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "source".to_string()),
            SourceConfig::Duckdb { .. } => "query".to_string(),
        }
    }

    /// Build the connector this config selects
    pub fn connector(&self) -> Result<Box<dyn Connector>, ConfigError> {
        match &self.source {
            SourceConfig::Delimited {
                path,
                has_header,
                options,
            } => Ok(Box::new(
                DelimitedConnector::new(path.clone())
                    .with_header(*has_header)
                    .with_options(*options),
            )),
            #[cfg(feature = "duckdb-backend")]
            SourceConfig::Duckdb {
                url,
                user,
                password,
                query,
            } => Ok(Box::new(
                super::database::DuckDbConnector::new(url.clone(), query.clone())
                    .with_credentials(user.clone(), password.clone()),
            )),
            #[cfg(not(feature = "duckdb-backend"))]
            SourceConfig::Duckdb { .. } => Err(ConfigError::Invalid(
                "DuckDB sources require the duckdb-backend feature".to_string(),
            )),
        }
    }

    /// Build the loader for the configured target, if any
    pub fn loader(&self) -> Result<Option<Box<dyn Loader>>, ConfigError> {
        match &self.target {
            None => Ok(None),
            Some(TargetConfig::File { path, header }) => Ok(Some(Box::new(
                FileLoader::new(path.clone()).with_header(*header),
            ))),
            #[cfg(feature = "duckdb-backend")]
            Some(TargetConfig::Staging { database, table }) => {
                let loader = if database == ":memory:" {
                    super::loader::StagingLoader::memory(table)
                } else {
                    super::loader::StagingLoader::open(database, table)
                }
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Some(Box::new(loader)))
            }
            #[cfg(not(feature = "duckdb-backend"))]
            Some(TargetConfig::Staging { .. }) => Err(ConfigError::Invalid(
                "Staging targets require the duckdb-backend feature".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extract.toml");
        std::fs::write(
            &path,
            r#"
name = "sales"
sink_dir = "/tmp/sinks"

[source]
kind = "delimited"
path = "data/sales.csv"

[source.options]
delimiter = ";"

[inference]
sample_size = 50

[target]
kind = "file"
path = "out/sales.csv"
"#,
        )
        .unwrap();

        let config = ExtractConfig::from_file(&path).unwrap();
        assert_eq!(config.schema_name(), "sales");
        assert_eq!(config.inference.sample_size, 50);
        assert_eq!(config.sink_dir, Some(PathBuf::from("/tmp/sinks")));
        match &config.source {
            SourceConfig::Delimited {
                has_header,
                options,
                ..
            } => {
                assert!(*has_header);
                assert_eq!(options.delimiter, ';');
                assert_eq!(options.quote, '"');
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert!(matches!(config.target, Some(TargetConfig::File { header: true, .. })));
    }

    #[test]
    fn test_json_and_yaml_configs() {
        let dir = TempDir::new().unwrap();

        let json = dir.path().join("extract.json");
        std::fs::write(
            &json,
            r#"{"source": {"kind": "duckdb", "url": ":memory:", "query": "SELECT 1", "password": "secret"}}"#,
        )
        .unwrap();
        let config = ExtractConfig::from_file(&json).unwrap();
        assert_eq!(config.source.kind(), "duckdb");
        assert_eq!(config.schema_name(), "query");

        let yaml = dir.path().join("extract.yaml");
        std::fs::write(
            &yaml,
            "source:\n  kind: delimited\n  path: Monthly Report.csv\n  has_header: false\n",
        )
        .unwrap();
        let config = ExtractConfig::from_file(&yaml).unwrap();
        assert_eq!(config.schema_name(), "monthlyreport");
    }

    #[test]
    fn test_invalid_configs() {
        let missing_query = ExtractConfig::new(SourceConfig::Duckdb {
            url: "db.duckdb".to_string(),
            user: None,
            password: None,
            query: " ".to_string(),
        });
        assert!(missing_query.validate().is_err());

        let bad_table = ExtractConfig::new(SourceConfig::Delimited {
            path: PathBuf::from("a.csv"),
            has_header: true,
            options: DelimitedOptions::default(),
        })
        .with_target(TargetConfig::Staging {
            database: ":memory:".to_string(),
            table: "99".to_string(),
        });
        assert!(bad_table.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "source = [").unwrap();
        let err = ExtractConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.user_message().contains("Hint:"));
    }

    #[test]
    fn test_delimited_connector_from_config() {
        let config = ExtractConfig::new(SourceConfig::Delimited {
            path: PathBuf::from("a.csv"),
            has_header: true,
            options: DelimitedOptions::default(),
        });
        assert_eq!(config.connector().unwrap().name(), "delimited");
        assert!(config.loader().unwrap().is_none());
    }
}
