//! Source connector capabilities
//!
//! A [`Connector`] knows how to reach one kind of source. Connecting yields a
//! [`Session`] that owns every handle acquired for the pass; the session can
//! optionally declare column types, streams rows to a [`RowVisitor`], and is
//! closed explicitly so that release failures can be reported.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::error::{ExtractError, ExtractResult};
use crate::schema::SourceSchema;
use crate::source::{DelimitedOptions, DelimitedSource, SourceError, TabularSource};

/// Receives rows in source order
pub trait RowVisitor {
    /// Called once the row cursor is open, before the first row
    fn cursor_opened(&mut self) {}

    /// Accept one row
    fn visit(&mut self, row: &[String]) -> ExtractResult<()>;

    /// Whether another row should be fetched
    ///
    /// Sessions check this before every fetch; returning `false` ends the
    /// stream as if the source were exhausted.
    fn wants_more(&self) -> bool {
        true
    }
}

impl<F> RowVisitor for F
where
    F: FnMut(&[String]) -> ExtractResult<()>,
{
    fn visit(&mut self, row: &[String]) -> ExtractResult<()> {
        self(row)
    }
}

/// Handles acquired for one extraction pass
pub trait Session {
    /// Column schema declared by the source, or `None` for untyped sources
    fn describe(&mut self) -> ExtractResult<Option<SourceSchema>>;

    /// Stream data rows to `visitor` until the source is exhausted or the
    /// visitor wants no more, returning the number of rows visited
    ///
    /// Statement and cursor handles live only for the duration of this
    /// call. An error from the visitor stops the stream and is returned
    /// unchanged.
    fn stream(&mut self, visitor: &mut dyn RowVisitor) -> ExtractResult<u64>;

    /// Raw column names seen while streaming, for untyped sources with a header
    fn column_names(&self) -> Option<&[String]> {
        None
    }

    /// Release the session's remaining handles
    fn close(self: Box<Self>) -> ExtractResult<()>;
}

/// Opens sessions against one configured source
pub trait Connector {
    /// Short label for logs
    fn name(&self) -> &str;

    /// Acquire a session; no retry is attempted
    fn connect(&self) -> ExtractResult<Box<dyn Session>>;
}

/// Check that `sql` is exactly one query statement
pub fn validate_query(sql: &str) -> ExtractResult<()> {
    let dialect = GenericDialect {};
    let statements = Parser::parse_sql(&dialect, sql)
        .map_err(|e| ExtractError::query_with("SQL validation failed", sql, e))?;

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [] => Err(ExtractError::query("empty query", Some(sql))),
        [_] => Err(ExtractError::query(
            "only SELECT queries can be extracted",
            Some(sql),
        )),
        many => Err(ExtractError::query(
            format!("expected one statement, found {}", many.len()),
            Some(sql),
        )),
    }
}

/// Connector for delimited text files
#[derive(Debug, Clone)]
pub struct DelimitedConnector {
    path: PathBuf,
    options: DelimitedOptions,
    has_header: bool,
}

impl DelimitedConnector {
    /// Connector for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: DelimitedOptions::default(),
            has_header: true,
        }
    }

    /// Set the dialect
    pub fn with_options(mut self, options: DelimitedOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether the first record holds column names
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the first record is read as the header
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Dialect used to read the file
    pub fn options(&self) -> DelimitedOptions {
        self.options
    }
}

impl Connector for DelimitedConnector {
    fn name(&self) -> &str {
        "delimited"
    }

    fn connect(&self) -> ExtractResult<Box<dyn Session>> {
        self.options.validate().map_err(ExtractError::Config)?;
        let source = DelimitedSource::open(&self.path, self.options).map_err(|e| match e {
            SourceError::FileNotFound(path) => {
                ExtractError::connection(format!("file not found: {}", path.display()))
            }
            other => ExtractError::connection_with("opening delimited file", other),
        })?;
        debug!(path = %self.path.display(), "Opened delimited file");

        Ok(Box::new(DelimitedSession {
            source: Some(source),
            has_header: self.has_header,
            header: None,
        }))
    }
}

struct DelimitedSession {
    source: Option<DelimitedSource<BufReader<File>>>,
    has_header: bool,
    header: Option<Vec<String>>,
}

impl Session for DelimitedSession {
    fn describe(&mut self) -> ExtractResult<Option<SourceSchema>> {
        Ok(None)
    }

    fn stream(&mut self, visitor: &mut dyn RowVisitor) -> ExtractResult<u64> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| ExtractError::stream("delimited file already consumed"))?;

        if self.has_header {
            self.header = source.next_row()?;
        }
        visitor.cursor_opened();

        let mut rows = 0;
        while visitor.wants_more() {
            let Some(row) = source.next_row()? else {
                break;
            };
            visitor.visit(&row)?;
            rows += 1;
        }
        self.source = None;
        Ok(rows)
    }

    fn column_names(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn close(self: Box<Self>) -> ExtractResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_validate_query() {
        assert!(validate_query("SELECT a, b FROM t WHERE a > 1").is_ok());
        assert!(validate_query("WITH x AS (SELECT 1) SELECT * FROM x").is_ok());

        let err = validate_query("DELETE FROM t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(validate_query("SELECT 1; SELECT 2").is_err());
        assert!(validate_query("SELEC nonsense").is_err());
        assert!(validate_query("").is_err());
    }

    #[test]
    fn test_missing_file_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let connector = DelimitedConnector::new(dir.path().join("missing.csv"));
        let err = connector.connect().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_stream_skips_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "id,name\n1,a\n2,b\n").unwrap();

        let mut session = DelimitedConnector::new(&path).connect().unwrap();
        assert!(session.describe().unwrap().is_none());

        let mut seen = Vec::new();
        let mut collect = |row: &[String]| -> ExtractResult<()> {
            seen.push(row.to_vec());
            Ok(())
        };
        let rows = session.stream(&mut collect).unwrap();
        assert_eq!(session.column_names().unwrap(), ["id", "name"]);
        session.close().unwrap();

        assert_eq!(rows, 2);
        assert_eq!(seen, vec![vec!["1", "a"], vec!["2", "b"]]);
    }

    #[test]
    fn test_stream_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.tsv");
        std::fs::write(&path, "1\ta\n").unwrap();

        let connector = DelimitedConnector::new(&path)
            .with_header(false)
            .with_options(DelimitedOptions::with_delimiter('\t'));
        assert!(!connector.has_header());
        assert_eq!(connector.options().delimiter, '\t');
        let mut session = connector.connect().unwrap();
        let mut count = 0;
        let mut counter = |row: &[String]| -> ExtractResult<()> {
            assert_eq!(row.len(), 2);
            count += 1;
            Ok(())
        };
        assert_eq!(session.stream(&mut counter).unwrap(), 1);
        assert_eq!(count, 1);
    }

    struct FirstRows {
        rows: Vec<Vec<String>>,
        limit: usize,
    }

    impl RowVisitor for FirstRows {
        fn visit(&mut self, row: &[String]) -> ExtractResult<()> {
            self.rows.push(row.to_vec());
            Ok(())
        }

        fn wants_more(&self) -> bool {
            self.rows.len() < self.limit
        }
    }

    #[test]
    fn test_stream_stops_when_visitor_is_done() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let mut content = b"id\n1\n2\n3\n".to_vec();
        content.extend_from_slice(b"\xff\xfe\n");
        std::fs::write(&path, content).unwrap();

        let mut session = DelimitedConnector::new(&path).connect().unwrap();
        let mut first = FirstRows {
            rows: Vec::new(),
            limit: 2,
        };
        assert_eq!(session.stream(&mut first).unwrap(), 2);
        assert_eq!(first.rows, vec![vec!["1"], vec!["2"]]);
        session.close().unwrap();
    }
}
