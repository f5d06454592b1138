//! Query sources that back declared cursors.
//!
//! Cursors do not parse or plan SQL. Opening a cursor hands its source to a
//! [`QueryEngine`], which returns the materialized result.

use std::fmt;

use strata_common::StrataResult;

use crate::context::ExecContext;
use crate::data::View;

/// An opaque SELECT query understood by the [`QueryEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectQuery {
    /// Query text.
    pub text: String,
}

impl SelectQuery {
    /// Creates a query from its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// One statement of a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A SELECT query.
    Select(SelectQuery),
    /// Any statement that does not produce a result set.
    Other(String),
}

/// A named, prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    /// Statement name.
    pub name: String,
    /// Parsed statements.
    pub statements: Vec<Statement>,
}

impl PreparedStatement {
    /// Creates a prepared statement.
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            statements,
        }
    }

    /// Returns the query if this statement is exactly one SELECT.
    pub fn single_select(&self) -> Option<&SelectQuery> {
        match self.statements.as_slice() {
            [Statement::Select(query)] => Some(query),
            _ => None,
        }
    }
}

/// What a declared cursor reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    /// A SELECT query.
    Query(SelectQuery),
    /// The name of a prepared statement.
    Statement(String),
}

/// Runs the queries behind cursors.
pub trait QueryEngine: Send + Sync {
    /// Executes a SELECT query and returns its materialized result.
    fn execute_select(&self, ctx: &ExecContext, query: &SelectQuery) -> StrataResult<View>;

    /// Looks up a prepared statement by name.
    fn prepared_statement(&self, name: &str) -> Option<PreparedStatement>;
}
