//! Delimited text file source

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Row, SourceError, TabularSource};

/// Dialect options for delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    /// Field separator (ASCII)
    pub delimiter: char,
    /// Quote character (ASCII)
    pub quote: char,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
        }
    }
}

impl DelimitedOptions {
    /// Options with a custom delimiter
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// Check that both characters fit in a single byte
    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() {
            return Err(format!("Delimiter must be ASCII, got {:?}", self.delimiter));
        }
        if !self.quote.is_ascii() {
            return Err(format!("Quote must be ASCII, got {:?}", self.quote));
        }
        if self.delimiter == self.quote {
            return Err("Delimiter and quote must differ".to_string());
        }
        Ok(())
    }

    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter as u8)
            .quote(self.quote as u8);
        builder
    }

    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter as u8)
            .quote(self.quote as u8);
        builder
    }
}

/// Rows from delimited text, header included as the first row
///
/// Records of differing widths are passed through unchanged; callers decide
/// what a ragged row means.
pub struct DelimitedSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    read: u64,
}

impl DelimitedSource<BufReader<File>> {
    /// Open a delimited file
    pub fn open(path: &Path, options: DelimitedOptions) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), options))
    }
}

impl<R: Read> DelimitedSource<R> {
    /// Wrap any reader
    pub fn from_reader(reader: R, options: DelimitedOptions) -> Self {
        Self {
            reader: options.reader_builder().from_reader(reader),
            record: csv::StringRecord::new(),
            read: 0,
        }
    }
}

impl<R: Read> TabularSource for DelimitedSource<R> {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        self.read += 1;
        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }

    fn rows_read(&self) -> u64 {
        self.read
    }
}
