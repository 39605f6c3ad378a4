//! Extraction of tabular sources into a file-backed sink
//!
//! An [`ExtractionPipeline`] connects to a source through a [`Connector`],
//! streams every row into a temporary delimited file, works out the column
//! schema and releases every handle it acquired, whatever the outcome.
//!
//! ## Stages
//!
//! ```text
//! Idle -> Connected -> Executing -> Streaming -> Cleanup -> Completed | Failed
//! ```
//!
//! A connection failure goes straight from `Idle` to `Failed`. Once a
//! session exists, `Cleanup` always runs before the terminal state.
//!
//! ## Schemas
//!
//! Sources that declare column types (SQL databases) are typed through
//! [`column_type`]; untyped sources (delimited files) are typed by sampling
//! inference over the extracted rows. A schema file configured with
//! [`ExtractionPipeline::with_schema_file`] replaces both.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tabular_ingest::extract::{DelimitedConnector, ExtractionPipeline, FileLoader};
//!
//! let connector = DelimitedConnector::new("sales.csv");
//! let mut pipeline = ExtractionPipeline::new(Box::new(connector), "sales");
//! let loaded = pipeline.extract_into(&mut FileLoader::new("staged/sales.csv"))?;
//! println!("{} rows loaded into {}", loaded.report.rows, loaded.report.target);
//! # Ok::<(), tabular_ingest::extract::ExtractError>(())
//! ```

mod config;
mod connector;
#[cfg(feature = "duckdb-backend")]
mod database;
mod error;
mod loader;
mod pipeline;
mod sink;
mod sql_types;
mod state;

pub use config::{ConfigError, ExtractConfig, SourceConfig, TargetConfig};
pub use connector::{Connector, DelimitedConnector, RowVisitor, Session, validate_query};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDbConnector;
pub use error::{ErrorKind, ExtractError, ExtractResult};
#[cfg(feature = "duckdb-backend")]
pub use loader::StagingLoader;
pub use loader::{FileLoader, LoadReport, Loader};
pub use pipeline::{ExtractStats, Extraction, ExtractionPipeline, Loaded, settle};
pub use sink::{MaterializedSink, RowSink};
pub use sql_types::{SqlTypeCode, column_type};
pub use state::{ExtractState, StateTracker};
