//! SQL connector backed by an embedded DuckDB database

use duckdb::Connection;
use tracing::{debug, info};

use super::connector::{Connector, RowVisitor, Session, validate_query};
use super::error::{ExtractError, ExtractResult};
use super::sql_types::SqlTypeCode;
use crate::schema::SourceSchema;

const IN_MEMORY: &str = ":memory:";

/// Connector running one query against a DuckDB database
///
/// `url` is a database path, optionally prefixed with `duckdb:` or
/// `jdbc:duckdb:`, or `:memory:`. User and password are accepted so that
/// SQL sources share one configuration shape; DuckDB ignores them.
#[derive(Clone)]
pub struct DuckDbConnector {
    url: String,
    user: Option<String>,
    password: Option<String>,
    query: String,
}

impl std::fmt::Debug for DuckDbConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbConnector")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("query", &self.query)
            .finish()
    }
}

impl DuckDbConnector {
    /// Connector for `query` against the database at `url`
    pub fn new(url: impl Into<String>, query: impl Into<String>) -> Self {
        let query: String = query.into();
        Self {
            url: url.into(),
            user: None,
            password: None,
            query: query.trim().trim_end_matches(';').trim_end().to_string(),
        }
    }

    /// Set credentials
    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    /// The source query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Database path with any scheme prefix removed
    pub fn database_path(&self) -> &str {
        let url = self.url.trim();
        url.strip_prefix("jdbc:duckdb:")
            .or_else(|| url.strip_prefix("duckdb:"))
            .unwrap_or(url)
    }

    fn open(&self) -> ExtractResult<Connection> {
        let path = self.database_path();
        let conn = if path.is_empty() || path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        };
        conn.map_err(|e| ExtractError::connection_with(format!("opening DuckDB at '{path}'"), e))
    }
}

impl Connector for DuckDbConnector {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn connect(&self) -> ExtractResult<Box<dyn Session>> {
        validate_query(&self.query)?;
        let conn = self.open()?;
        info!(
            database = self.database_path(),
            has_user = self.user.is_some(),
            has_password = self.password.is_some(),
            "Connected to DuckDB"
        );
        Ok(Box::new(DuckDbSession {
            conn,
            query: self.query.clone(),
        }))
    }
}

struct DuckDbSession {
    conn: Connection,
    query: String,
}

impl Session for DuckDbSession {
    fn describe(&mut self) -> ExtractResult<Option<SourceSchema>> {
        let sql = format!("DESCRIBE\n{}\n", self.query);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| ExtractError::query_with("describing query", &self.query, e))?;
        let described = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| ExtractError::query_with("describing query", &self.query, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExtractError::query_with("reading query description", &self.query, e))?;

        let columns = described.into_iter().map(|(name, type_name)| {
            let code = SqlTypeCode::from_type_name(&type_name);
            debug!(column = %name, declared = %type_name, ?code, "Declared column type");
            (name, code.semantic_type())
        });
        Ok(Some(SourceSchema::from_titles("query", columns)))
    }

    fn stream(&mut self, visitor: &mut dyn RowVisitor) -> ExtractResult<u64> {
        // Query on its own lines: a trailing `--` comment must not reach the `)`
        let sql = format!(
            "SELECT COLUMNS(*)::VARCHAR FROM (\n{}\n) AS source_query",
            self.query
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| ExtractError::query_with("preparing query", &self.query, e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| ExtractError::query_with("executing query", &self.query, e))?;
        let width = rows.as_ref().map(|s| s.column_count()).unwrap_or(0);
        visitor.cursor_opened();

        let mut count = 0;
        let mut cells: Vec<String> = Vec::with_capacity(width);
        while visitor.wants_more() {
            let Some(row) = rows
                .next()
                .map_err(|e| ExtractError::stream_with("fetching row", e))?
            else {
                break;
            };
            cells.clear();
            for i in 0..width {
                let value: Option<String> = row
                    .get(i)
                    .map_err(|e| ExtractError::stream_with(format!("reading column {i}"), e))?;
                cells.push(value.unwrap_or_default());
            }
            visitor.visit(&cells)?;
            count += 1;
        }
        Ok(count)
    }

    fn close(self: Box<Self>) -> ExtractResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ExtractError::connection_with("closing DuckDB connection", e))
    }
}
