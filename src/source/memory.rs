//! In-memory row source

use std::collections::VecDeque;

use super::{Row, SourceError, TabularSource};

/// Source over rows already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: VecDeque<Row>,
    read: u64,
}

impl MemorySource {
    /// Create a source from owned rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into(),
            read: 0,
        }
    }

    /// Create a source from string slices
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Single-column source, one row per value
    pub fn column<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(values.into_iter().map(|v| vec![v.into()]).collect())
    }

    /// Rows not yet read
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl TabularSource for MemorySource {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        let row = self.rows.pop_front();
        if row.is_some() {
            self.read += 1;
        }
        Ok(row)
    }

    fn rows_read(&self) -> u64 {
        self.read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_order() {
        let mut source = MemorySource::from_rows([["a", "1"], ["b", "2"]]);
        assert_eq!(source.next_row().unwrap(), Some(vec!["a".to_string(), "1".to_string()]));
        assert_eq!(source.next_row().unwrap(), Some(vec!["b".to_string(), "2".to_string()]));
        assert_eq!(source.next_row().unwrap(), None);
        assert_eq!(source.rows_read(), 2);
    }

    #[test]
    fn test_column() {
        let mut source = MemorySource::column(["x", "y"]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_row().unwrap(), Some(vec!["x".to_string()]));
        assert_eq!(source.remaining(), 1);
    }
}
