//! Name-keyed cursor store.
//!
//! Cursor names are case-insensitive. Operations clone the cursor's `Arc`
//! out of the map before acting, so a long-running open never blocks other
//! cursors.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use strata_common::{StrataError, StrataResult};

use super::cursor::{Cursor, FetchPosition};
use super::source::{CursorSource, QueryEngine};
use crate::context::ExecContext;
use crate::data::{Ternary, Value};

/// Cursors declared in one scope.
#[derive(Debug, Default)]
pub struct CursorRegistry {
    cursors: DashMap<String, Arc<Cursor>>,
}

impl CursorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a cursor over `source`.
    pub fn declare(&self, name: &str, source: CursorSource) -> StrataResult<()> {
        self.insert(Cursor::new(name, source))
    }

    /// Adds a pseudo cursor over `values`.
    pub fn add_pseudo(&self, name: &str, values: Vec<Value>) -> StrataResult<()> {
        self.insert(Cursor::pseudo(name, values))
    }

    /// Removes a declared cursor.
    pub fn dispose(&self, name: &str) -> StrataResult<()> {
        let cursor = self.get(name)?;
        if cursor.is_pseudo() {
            return Err(StrataError::PseudoCursor {
                name: name.to_string(),
            });
        }
        self.cursors.remove(&key(name));
        tracing::trace!(cursor = name, "cursor disposed");
        Ok(())
    }

    /// Opens a cursor.
    pub fn open(&self, ctx: &ExecContext, name: &str, engine: &dyn QueryEngine) -> StrataResult<()> {
        self.get(name)?.open(ctx, engine)
    }

    /// Closes a cursor.
    pub fn close(&self, name: &str) -> StrataResult<()> {
        self.get(name)?.close()
    }

    /// Fetches from a cursor.
    pub fn fetch(&self, name: &str, position: FetchPosition) -> StrataResult<Option<Vec<Value>>> {
        self.get(name)?.fetch(position)
    }

    /// Fetches from a cursor into `slots`.
    pub fn fetch_into(
        &self,
        name: &str,
        position: FetchPosition,
        slots: &mut [Value],
    ) -> StrataResult<bool> {
        self.get(name)?.fetch_into(position, slots)
    }

    /// Returns TRUE if the cursor is open.
    pub fn is_open(&self, name: &str) -> StrataResult<Ternary> {
        Ok(self.get(name)?.is_open())
    }

    /// Returns whether the cursor is positioned on a row.
    pub fn is_in_range(&self, name: &str) -> StrataResult<Ternary> {
        self.get(name)?.is_in_range()
    }

    /// Returns the number of rows of an open cursor.
    pub fn count(&self, name: &str) -> StrataResult<usize> {
        self.get(name)?.count()
    }

    /// Returns the cursor registered under `name`.
    pub fn get(&self, name: &str) -> StrataResult<Arc<Cursor>> {
        self.cursors
            .get(&key(name))
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| StrataError::UndeclaredCursor {
                name: name.to_string(),
            })
    }

    /// Returns true if a cursor named `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.cursors.contains_key(&key(name))
    }

    /// Closes every declared cursor. Pseudo cursors stay open.
    pub fn close_all(&self) {
        let cursors: Vec<Arc<Cursor>> = self
            .cursors
            .iter()
            .filter(|r| !r.value().is_pseudo())
            .map(|r| Arc::clone(r.value()))
            .collect();
        for cursor in cursors {
            // Declared cursors never fail to close.
            let _ = cursor.close();
        }
    }

    /// Returns the number of cursors.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Returns true if no cursor is registered.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    fn insert(&self, cursor: Cursor) -> StrataResult<()> {
        match self.cursors.entry(key(cursor.name())) {
            Entry::Occupied(_) => Err(StrataError::CursorRedeclared {
                name: cursor.name().to_string(),
            }),
            Entry::Vacant(entry) => {
                tracing::trace!(cursor = cursor.name(), pseudo = cursor.is_pseudo(), "cursor declared");
                entry.insert(Arc::new(cursor));
                Ok(())
            }
        }
    }
}

fn key(name: &str) -> String {
    name.to_uppercase()
}
