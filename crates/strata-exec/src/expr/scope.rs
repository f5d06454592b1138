//! Single-row evaluation scope.

use crate::data::{Header, Record};

/// The evaluation context for one candidate row.
///
/// Each join partition owns one scope and overwrites its current record
/// before every predicate evaluation.
#[derive(Debug)]
pub struct RowScope<'a> {
    header: &'a Header,
    record: Option<Record>,
}

impl<'a> RowScope<'a> {
    /// Creates an empty scope over `header`.
    pub fn new(header: &'a Header) -> Self {
        Self {
            header,
            record: None,
        }
    }

    /// Creates a scope with a current record installed.
    pub fn with_record(header: &'a Header, record: Record) -> Self {
        Self {
            header,
            record: Some(record),
        }
    }

    /// Returns the header of the current record.
    pub fn header(&self) -> &Header {
        self.header
    }

    /// Returns the current record.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Installs the current record, returning the previous one.
    pub fn set_record(&mut self, record: Record) -> Option<Record> {
        self.record.replace(record)
    }

    /// Removes and returns the current record.
    pub fn take_record(&mut self) -> Option<Record> {
        self.record.take()
    }
}
