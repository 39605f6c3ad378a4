//! Error types for extraction
//!
//! Acquisition and streaming failures are fatal to one extraction call and
//! are never retried here; a caller wrapping the pipeline owns any retry
//! policy. Classification has no error type: malformed values are data.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::source::SourceError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad category of an [`ExtractError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source unreachable or authentication failed
    Connection,
    /// Malformed query or unsupported source shape
    Query,
    /// IO failure mid-read or mid-write
    Stream,
    /// Downstream loader failure
    Load,
    /// Invalid configuration
    Config,
    /// Schema config file problem
    Schema,
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Cannot reach or authenticate to the source, or failed to release it
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Query rejected by the parser or the source
    #[error("Query error: {message}")]
    Query {
        message: String,
        sql: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    /// Failure while reading the source or writing the sink
    #[error("Stream error: {message}")]
    Stream {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Downstream loader rejected the sink
    #[error("Load error: {0}")]
    Load(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema config file error
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

impl ExtractError {
    /// Connection error without an underlying cause
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Connection error wrapping its cause
    pub fn connection_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Query error for `sql`
    pub fn query(message: impl Into<String>, sql: Option<&str>) -> Self {
        Self::Query {
            message: message.into(),
            sql: sql.map(str::to_string),
            source: None,
        }
    }

    /// Query error for `sql` wrapping its cause
    pub fn query_with<E>(message: impl Into<String>, sql: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            message: message.into(),
            sql: Some(sql.to_string()),
            source: Some(Box::new(source)),
        }
    }

    /// Stream error without an underlying cause
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
            source: None,
        }
    }

    /// Stream error wrapping its cause
    pub fn stream_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Stream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Connection { .. } => ErrorKind::Connection,
            ExtractError::Query { .. } => ErrorKind::Query,
            ExtractError::Stream { .. } => ErrorKind::Stream,
            ExtractError::Load(_) => ErrorKind::Load,
            ExtractError::Config(_) => ErrorKind::Config,
            ExtractError::Schema(_) => ErrorKind::Schema,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::Connection { message, .. } => format!(
                "Cannot connect to source: {message}\n\n\
                Hint: Check the connection URL, credentials and that the source is reachable."
            ),
            ExtractError::Query {
                message,
                sql: Some(sql),
                ..
            } => format!(
                "Query failed: {message}\nQuery: {sql}\n\n\
                Hint: The source query must be a single SELECT statement."
            ),
            ExtractError::Stream { message, .. } => format!(
                "Extraction interrupted: {message}\n\n\
                Hint: No data was handed to the loader. Re-run the extraction once the source is available."
            ),
            ExtractError::Config(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check your extraction configuration file.")
            }
            ExtractError::Schema(err) => err.user_message(),
            _ => self.to_string(),
        }
    }
}

impl From<SourceError> for ExtractError {
    fn from(err: SourceError) -> Self {
        ExtractError::stream_with("reading source rows", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kinds() {
        assert_eq!(ExtractError::connection("refused").kind(), ErrorKind::Connection);
        assert_eq!(ExtractError::query("bad", None).kind(), ErrorKind::Query);
        assert_eq!(ExtractError::stream("dropped").kind(), ErrorKind::Stream);
        assert_eq!(ExtractError::Config("x".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_source_error_becomes_stream_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err: ExtractError = SourceError::Io(io).into();
        assert_eq!(err.kind(), ErrorKind::Stream);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_user_message() {
        let err = ExtractError::query("expected SELECT", Some("DROP TABLE t"));
        let msg = err.user_message();
        assert!(msg.contains("DROP TABLE t"));
        assert!(msg.contains("Hint:"));

        let err = ExtractError::connection_with(
            "opening database",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.user_message().contains("opening database"));
    }
}
