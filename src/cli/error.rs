//! CLI error type

use tabular_ingest::extract::{ConfigError, ExtractError};
use tabular_ingest::{SchemaError, SourceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    /// Message printed before exiting
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(e) => e.user_message(),
            CliError::Extract(e) => e.user_message(),
            CliError::Source(e) => e.user_message(),
            CliError::Schema(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
