//! Semantic type inference for untyped tabular data
//!
//! This module guesses whether each column of a delimited file (or any
//! other untyped [`TabularSource`](crate::source::TabularSource)) holds
//! dates, numeric facts or categorical attributes.
//!
//! ## How it works
//!
//! - **Value classification** - each cell is tested as an integer, a decimal
//!   (after stripping currency and separator noise) and a date in a fixed
//!   list of patterns
//! - **Exclusion ratchet** - a cell that is not a date rules out `DATE` for
//!   its column for good; a cell that is not a decimal rules out `FACT`
//! - **Bounded sample** - only the first 1000 data rows are read by default
//! - **Precedence** - `DATE` wins over `FACT`, `FACT` over `ATTRIBUTE`
//!
//! ## Example
//!
//! ```rust
//! use tabular_ingest::inference::{SemanticType, guess_schema};
//! use tabular_ingest::source::MemorySource;
//!
//! let source = MemorySource::from_rows([
//!     ["day", "revenue", "region"],
//!     ["2009-01-05", "1,200.50", "north"],
//!     ["2009-01-06", "980", "south"],
//! ]);
//! let types = guess_schema(source, true).unwrap();
//! assert_eq!(
//!     types,
//!     vec![SemanticType::Date, SemanticType::Fact, SemanticType::Attribute]
//! );
//! ```

mod classifier;
mod config;
mod guess;
mod types;

pub use classifier::{DateFormat, ValueClassifier, is_date, is_decimal, is_integer};
pub use config::{
    ClassifierConfig, DEFAULT_DATE_FORMATS, DEFAULT_DISCARD_CHARS, DEFAULT_SAMPLE_SIZE,
    InferenceConfig, InferenceConfigBuilder,
};
pub use guess::{ColumnTypeInferencer, InferenceOutcome, InferenceStats, guess_schema};
pub use types::{ColumnExclusions, SemanticType};
