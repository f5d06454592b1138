//! Registry of materialized views.
//!
//! Maps identifiers (exact, case-sensitive) to views. Loads hand out copies
//! so callers may mutate what they receive without affecting the stored
//! view.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use strata_common::{StrataError, StrataResult};

use super::View;

/// Identifier to view store shared by the statement executor.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: DashMap<String, View>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new view. Fails if the identifier is already taken.
    pub fn store(&self, identifier: impl Into<String>, view: View) -> StrataResult<()> {
        match self.views.entry(identifier.into()) {
            Entry::Occupied(entry) => Err(StrataError::ViewRedeclared {
                identifier: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(view);
                Ok(())
            }
        }
    }

    /// Stores a view, replacing any previous view with the same identifier.
    pub fn replace(&self, identifier: impl Into<String>, view: View) -> Option<View> {
        self.views.insert(identifier.into(), view)
    }

    /// Returns a copy of the stored view.
    pub fn load(&self, identifier: &str) -> StrataResult<View> {
        self.views
            .get(identifier)
            .map(|view| view.value().clone())
            .ok_or_else(|| StrataError::ViewNotLoaded {
                identifier: identifier.to_string(),
            })
    }

    /// Removes a view and returns it.
    pub fn delete(&self, identifier: &str) -> StrataResult<View> {
        self.views
            .remove(identifier)
            .map(|(_, view)| view)
            .ok_or_else(|| StrataError::ViewNotLoaded {
                identifier: identifier.to_string(),
            })
    }

    /// Returns true if a view is stored under the identifier.
    pub fn exists(&self, identifier: &str) -> bool {
        self.views.contains_key(identifier)
    }

    /// Returns the stored identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.views.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns the number of stored views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns true if no views are stored.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Removes every view.
    pub fn clear(&self) {
        self.views.clear();
    }
}
