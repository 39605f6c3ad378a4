//! File-backed row store
//!
//! Rows are appended as delimited records to a temporary file while the
//! source is streamed, so a result set is never held in memory. The file is
//! deleted when the sink (or the [`MaterializedSink`] it becomes) is dropped.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

use super::error::{ExtractError, ExtractResult};
use crate::source::{DelimitedOptions, DelimitedSource};

const SINK_PREFIX: &str = "extract-";
const SINK_SUFFIX: &str = ".csv";

/// Open sink receiving rows
pub struct RowSink {
    writer: csv::Writer<NamedTempFile>,
    path: PathBuf,
    options: DelimitedOptions,
    rows: u64,
}

impl RowSink {
    /// Create a sink in the system temp directory, or in `dir` when given
    pub fn create(dir: Option<&Path>, options: DelimitedOptions) -> ExtractResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SINK_PREFIX).suffix(SINK_SUFFIX);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| ExtractError::stream_with("creating sink file", e))?;

        let path = file.path().to_path_buf();
        Ok(Self {
            writer: options.writer_builder().from_writer(file),
            path,
            options,
            rows: 0,
        })
    }

    /// Append one row
    pub fn write_row(&mut self, row: &[String]) -> ExtractResult<()> {
        self.writer
            .write_record(row)
            .map_err(|e| ExtractError::stream_with("writing sink row", e))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the sink
    pub fn finish(mut self) -> ExtractResult<MaterializedSink> {
        self.writer
            .flush()
            .map_err(|e| ExtractError::stream_with("flushing sink", e))?;
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| ExtractError::stream(format!("closing sink: {}", e.error())))?;
        file.flush()
            .map_err(|e| ExtractError::stream_with("flushing sink", e))?;
        let bytes = file
            .as_file()
            .metadata()
            .map_err(|e| ExtractError::stream_with("reading sink size", e))?
            .len();

        Ok(MaterializedSink {
            path: file.into_temp_path(),
            options: self.options,
            rows: self.rows,
            bytes,
        })
    }
}

/// Closed sink handed to a loader
#[derive(Debug)]
pub struct MaterializedSink {
    path: TempPath,
    options: DelimitedOptions,
    rows: u64,
    bytes: u64,
}

impl MaterializedSink {
    /// Location of the backing file (valid until drop)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// File size in bytes
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Dialect the rows were written in
    pub fn options(&self) -> DelimitedOptions {
        self.options
    }

    /// Read the rows back
    pub fn open(&self) -> ExtractResult<DelimitedSource<BufReader<File>>> {
        DelimitedSource::open(&self.path, self.options)
            .map_err(|e| ExtractError::stream_with("reopening sink", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TabularSource;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let mut sink = RowSink::create(Some(dir.path()), DelimitedOptions::default()).unwrap();
        sink.write_row(&row(&["1", "Smith, John"])).unwrap();
        sink.write_row(&row(&["2", "plain"])).unwrap();
        assert_eq!(sink.rows(), 2);

        let sink = sink.finish().unwrap();
        assert_eq!(sink.rows(), 2);
        assert!(sink.bytes() > 0);

        let mut source = sink.open().unwrap();
        assert_eq!(source.next_row().unwrap().unwrap(), row(&["1", "Smith, John"]));
        assert_eq!(source.next_row().unwrap().unwrap(), row(&["2", "plain"]));
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let mut sink = RowSink::create(Some(dir.path()), DelimitedOptions::default()).unwrap();
        sink.write_row(&row(&["x"])).unwrap();
        let open_path = sink.path().to_path_buf();
        assert!(open_path.exists());
        drop(sink);
        assert!(!open_path.exists());

        let sink = RowSink::create(Some(dir.path()), DelimitedOptions::default())
            .unwrap()
            .finish()
            .unwrap();
        let closed_path = sink.path().to_path_buf();
        assert!(closed_path.exists());
        drop(sink);
        assert!(!closed_path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
