//! Cursors.
//!
//! A [`Cursor`] is a mutex-guarded position over a materialized result.
//! Declared cursors read from a [`CursorSource`] through a [`QueryEngine`];
//! pseudo cursors iterate over a fixed list of values. [`CursorRegistry`]
//! stores cursors by case-insensitive name.

#[allow(clippy::module_inception)]
mod cursor;
mod registry;
mod source;

pub use cursor::{Cursor, FetchPosition};
pub use registry::CursorRegistry;
pub use source::{CursorSource, PreparedStatement, QueryEngine, SelectQuery, Statement};
