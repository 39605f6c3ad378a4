//! Tabular Ingest - extraction and semantic typing of tabular sources
//!
//! Provides:
//! - Row sources over delimited text and in-memory data
//! - Column type inference (`DATE`, `FACT`, `ATTRIBUTE`) over a bounded sample
//! - An extraction pipeline that streams a SQL query or a file into a
//!   temporary sink and always releases its handles
//! - Source schema config files (JSON or YAML)
//!
//! # Features
//!
//! - `duckdb-backend` - DuckDB query connector and staging loader
//! - `cli` - the `tabular-ingest` command line tool

pub mod extract;
pub mod inference;
pub mod schema;
pub mod source;

pub use extract::{
    Connector, DelimitedConnector, ExtractConfig, ExtractError, ExtractionPipeline, Extraction,
    FileLoader, Loader, column_type,
};
#[cfg(feature = "duckdb-backend")]
pub use extract::{DuckDbConnector, StagingLoader};
pub use inference::{
    ColumnTypeInferencer, InferenceConfig, SemanticType, guess_schema, is_date, is_decimal,
    is_integer,
};
pub use schema::{SchemaError, SourceColumn, SourceSchema};
pub use source::{DelimitedOptions, DelimitedSource, MemorySource, Row, SourceError, TabularSource};
