//! Record representation.
//!
//! A `Record` is one fixed-width row of cells. Records double as scratch
//! buffers during joins, so they can be scrubbed and refilled in place.

use std::fmt;
use std::ops::{Index, IndexMut};

use super::Value;

/// A single row of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<Value>,
}

impl Record {
    /// Creates a new record with the given cells.
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    /// Creates a record with all NULL cells.
    pub fn nulls(width: usize) -> Self {
        Self {
            cells: vec![Value::Null; width],
        }
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if this record has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at the given index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }

    /// Returns the cells as a slice.
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Consumes the record and returns the cells.
    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }

    /// Concatenates this record with another record.
    pub fn concat(&self, other: &Record) -> Record {
        let mut cells = Vec::with_capacity(self.len() + other.len());
        cells.extend(self.cells.iter().cloned());
        cells.extend(other.cells.iter().cloned());
        Record { cells }
    }

    /// Overwrites this record with `left ++ right`.
    ///
    /// The record must already be `left.len() + right.len()` wide.
    pub fn fill_merged(&mut self, left: &[Value], right: &[Value]) {
        debug_assert_eq!(self.cells.len(), left.len() + right.len());
        let (head, tail) = self.cells.split_at_mut(left.len());
        head.clone_from_slice(left);
        tail.clone_from_slice(right);
    }

    /// Resets every cell to NULL without changing the width.
    pub fn scrub(&mut self) {
        for cell in &mut self.cells {
            *cell = Value::Null;
        }
    }

    /// Projects this record to the specified cells.
    pub fn project(&self, indices: &[usize]) -> Record {
        let cells = indices
            .iter()
            .map(|&i| self.cells.get(i).cloned().unwrap_or(Value::Null))
            .collect();
        Record { cells }
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.cells[index]
    }
}

impl IndexMut<usize> for Record {
    fn index_mut(&mut self, index: usize) -> &mut Value {
        &mut self.cells[index]
    }
}

impl From<Vec<Value>> for Record {
    fn from(cells: Vec<Value>) -> Self {
        Self::new(cells)
    }
}

impl IntoIterator for Record {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}
