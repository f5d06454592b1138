//! Materialized views.
//!
//! A `View` is a header plus an ordered record set. Every record is exactly
//! as wide as the header.

use std::fmt;

use strata_common::{StrataError, StrataResult};

use super::{Header, Record, Value};

/// A materialized tabular result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    header: Header,
    records: Vec<Record>,
}

impl View {
    /// Creates a view, checking that every record matches the header width.
    pub fn new(header: Header, records: Vec<Record>) -> StrataResult<Self> {
        if let Some((i, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != header.len())
        {
            return Err(StrataError::internal(format!(
                "record {} has {} cells, header has {} fields",
                i,
                record.len(),
                header.len()
            )));
        }
        Ok(Self { header, records })
    }

    /// Creates a view for `view_name` from column names and row values.
    pub fn from_values(
        view_name: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> StrataResult<Self> {
        let header = Header::new(view_name, columns);
        let records = rows.into_iter().map(Record::new).collect();
        Self::new(header, records)
    }

    /// Returns the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the record at the given index.
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Returns the number of fields.
    pub fn field_len(&self) -> usize {
        self.header.len()
    }

    /// Returns the number of records.
    pub fn record_len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the view has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the view and returns its parts.
    pub fn into_parts(self) -> (Header, Vec<Record>) {
        (self.header, self.records)
    }

    /// Replaces the header and records in place.
    ///
    /// Callers must keep every record as wide as the new header.
    pub(crate) fn replace(&mut self, header: Header, records: Vec<Record>) {
        debug_assert!(records.iter().all(|r| r.len() == header.len()));
        self.header = header;
        self.records = records;
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
