//! Pull-based row sources
//!
//! A [`TabularSource`] hands out rows one at a time until it reports end of
//! data. Inference and extraction both consume sources but never share one:
//! each pass opens its own reader.

mod delimited;
mod error;
mod memory;

pub use delimited::{DelimitedOptions, DelimitedSource};
pub use error::SourceError;
pub use memory::MemorySource;

/// An ordered sequence of string cells
pub type Row = Vec<String>;

/// Forward-only reader over rows of string cells
pub trait TabularSource {
    /// Read the next row, `Ok(None)` once the source is exhausted
    fn next_row(&mut self) -> Result<Option<Row>, SourceError>;

    /// Number of rows handed out so far
    fn rows_read(&self) -> u64;
}

impl<S: TabularSource + ?Sized> TabularSource for &mut S {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        (**self).next_row()
    }

    fn rows_read(&self) -> u64 {
        (**self).rows_read()
    }
}

impl<S: TabularSource + ?Sized> TabularSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        (**self).next_row()
    }

    fn rows_read(&self) -> u64 {
        (**self).rows_read()
    }
}
