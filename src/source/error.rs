//! Error types for tabular sources

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading rows from a source
#[derive(Error, Debug)]
pub enum SourceError {
    /// Source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed delimited record
    #[error("Delimited record error at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific read failure
    #[error("Read error: {0}")]
    Read(String),
}

impl SourceError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            SourceError::FileNotFound(path) => {
                format!(
                    "File not found: {}\n\nHint: Check that the file exists and the path is correct.",
                    path.display()
                )
            }
            SourceError::Csv { line, message } => {
                format!(
                    "Malformed record at line {line}: {message}\n\n\
                    Hint: Check the delimiter and quoting around line {line}."
                )
            }
            _ => self.to_string(),
        }
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        if err.is_io_error() {
            return match err.into_kind() {
                csv::ErrorKind::Io(io) => SourceError::Io(io),
                other => SourceError::Read(format!("{:?}", other)),
            };
        }
        SourceError::Csv {
            line,
            message: err.to_string(),
        }
    }
}
