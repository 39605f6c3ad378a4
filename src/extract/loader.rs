//! Downstream consumers of a finished extraction

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{ExtractError, ExtractResult};
use super::sink::MaterializedSink;
use crate::schema::SourceSchema;

/// Outcome of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Where the rows went
    pub target: String,
    /// Rows loaded
    pub rows: u64,
}

/// Receives a closed sink and its schema
///
/// Only ever called after a successful extraction.
pub trait Loader {
    /// Short label for logs
    fn name(&self) -> &str;

    /// Load every row of `sink`
    fn load(&mut self, sink: &MaterializedSink, schema: &SourceSchema) -> ExtractResult<LoadReport>;
}

/// Copies the sink to a file, optionally preceded by a header row
#[derive(Debug, Clone)]
pub struct FileLoader {
    destination: PathBuf,
    write_header: bool,
}

impl FileLoader {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            write_header: true,
        }
    }

    /// Whether to write the schema's column names first
    pub fn with_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn write(&self, sink: &MaterializedSink, schema: &SourceSchema) -> std::io::Result<()> {
        let file = File::create(&self.destination)?;
        let mut out = BufWriter::new(file);

        if self.write_header {
            let mut header = sink.options().writer_builder().from_writer(&mut out);
            header.write_record(schema.columns().iter().map(|c| c.name.as_str()))?;
            header.flush()?;
        }

        let mut input = File::open(sink.path())?;
        std::io::copy(&mut input, &mut out)?;
        out.flush()
    }
}

impl Loader for FileLoader {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&mut self, sink: &MaterializedSink, schema: &SourceSchema) -> ExtractResult<LoadReport> {
        self.write(sink, schema).map_err(|e| {
            ExtractError::Load(format!(
                "writing {}: {e}",
                self.destination.display()
            ))
        })?;
        info!(destination = %self.destination.display(), rows = sink.rows(), "Sink copied to file");

        Ok(LoadReport {
            target: self.destination.display().to_string(),
            rows: sink.rows(),
        })
    }
}

#[cfg(feature = "duckdb-backend")]
pub use staging::StagingLoader;

#[cfg(feature = "duckdb-backend")]
mod staging {
    use duckdb::Connection;
    use tracing::{info, warn};

    use super::{LoadReport, Loader};
    use crate::extract::error::{ExtractError, ExtractResult};
    use crate::extract::sink::MaterializedSink;
    use crate::schema::{SourceSchema, naming};
    use crate::source::TabularSource;

    /// Loads a sink into a table of a DuckDB staging database
    ///
    /// The table is replaced on every load and every column is `VARCHAR`;
    /// typing happens downstream from the schema. Rows are fitted to the
    /// schema width: missing cells become NULL and extra cells are dropped.
    pub struct StagingLoader {
        conn: Connection,
        table: String,
        path: Option<String>,
    }

    impl StagingLoader {
        /// Open or create a staging database at `path`
        pub fn open(path: &str, table: &str) -> ExtractResult<Self> {
            let conn = Connection::open(path)
                .map_err(|e| ExtractError::Load(format!("opening staging database: {e}")))?;
            Self::with_connection(conn, table, Some(path.to_string()))
        }

        /// In-memory staging database
        pub fn memory(table: &str) -> ExtractResult<Self> {
            let conn = Connection::open_in_memory()
                .map_err(|e| ExtractError::Load(format!("opening staging database: {e}")))?;
            Self::with_connection(conn, table, None)
        }

        fn with_connection(conn: Connection, table: &str, path: Option<String>) -> ExtractResult<Self> {
            let table = naming::format_short_name(table);
            if table.is_empty() {
                return Err(ExtractError::Config(
                    "staging table name has no identifier characters".to_string(),
                ));
            }
            Ok(Self { conn, table, path })
        }

        /// Target table
        pub fn table(&self) -> &str {
            &self.table
        }

        /// Rows currently in the target table
        pub fn row_count(&self) -> ExtractResult<u64> {
            let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table));
            let count: i64 = self
                .conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| ExtractError::Load(format!("counting staged rows: {e}")))?;
            Ok(count.max(0) as u64)
        }

        /// Run a query against the staging database, returning text cells
        pub fn query_rows(&self, sql: &str) -> ExtractResult<Vec<Vec<String>>> {
            let mut stmt = self
                .conn
                .prepare(sql)
                .map_err(|e| ExtractError::Load(format!("preparing staging query: {e}")))?;
            let mut rows = stmt
                .query([])
                .map_err(|e| ExtractError::Load(format!("running staging query: {e}")))?;
            let width = rows.as_ref().map(|s| s.column_count()).unwrap_or(0);

            let mut result = Vec::new();
            while let Some(row) = rows
                .next()
                .map_err(|e| ExtractError::Load(format!("reading staging rows: {e}")))?
            {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    let value: Option<String> = row
                        .get(i)
                        .map_err(|e| ExtractError::Load(format!("reading staging rows: {e}")))?;
                    cells.push(value.unwrap_or_default());
                }
                result.push(cells);
            }
            Ok(result)
        }

        fn create_table_sql(&self, schema: &SourceSchema) -> String {
            let columns: Vec<String> = schema
                .columns()
                .iter()
                .map(|c| format!("{} VARCHAR", quote_identifier(&c.name)))
                .collect();
            format!(
                "CREATE OR REPLACE TABLE {} ({})",
                quote_identifier(&self.table),
                columns.join(", ")
            )
        }

        fn insert_sql(&self, width: usize) -> String {
            let placeholders: Vec<String> = (1..=width).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {} VALUES ({})",
                quote_identifier(&self.table),
                placeholders.join(", ")
            )
        }
    }

    impl Loader for StagingLoader {
        fn name(&self) -> &str {
            "staging"
        }

        fn load(&mut self, sink: &MaterializedSink, schema: &SourceSchema) -> ExtractResult<LoadReport> {
            if schema.columns().is_empty() {
                return Err(ExtractError::Load("schema has no columns".to_string()));
            }

            let width = schema.columns().len();
            let insert = self.insert_sql(width);
            self.conn
                .execute_batch(&self.create_table_sql(schema))
                .map_err(|e| ExtractError::Load(format!("creating staging table: {e}")))?;

            let mut source = sink.open()?;
            let mut reshaped = 0u64;
            let tx = self
                .conn
                .transaction()
                .map_err(|e| ExtractError::Load(format!("starting staging transaction: {e}")))?;
            {
                let mut stmt = tx
                    .prepare(&insert)
                    .map_err(|e| ExtractError::Load(format!("preparing staging insert: {e}")))?;
                while let Some(row) = source
                    .next_row()
                    .map_err(|e| ExtractError::Load(format!("reading sink: {e}")))?
                {
                    if row.len() != width {
                        reshaped += 1;
                    }
                    // Short rows are padded with NULL, long rows truncated
                    let cells = (0..width).map(|i| row.get(i).map(String::as_str));
                    stmt.execute(duckdb::params_from_iter(cells))
                        .map_err(|e| ExtractError::Load(format!("inserting staged row: {e}")))?;
                }
            }
            tx.commit()
                .map_err(|e| ExtractError::Load(format!("committing staged rows: {e}")))?;
            if reshaped > 0 {
                warn!(
                    table = %self.table,
                    rows = reshaped,
                    columns = width,
                    "Rows did not match the schema width"
                );
            }

            let rows = self.row_count()?;
            info!(
                table = %self.table,
                database = self.path.as_deref().unwrap_or(":memory:"),
                rows,
                "Sink loaded into staging table"
            );
            Ok(LoadReport {
                target: self.table.clone(),
                rows,
            })
        }
    }

    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

}
