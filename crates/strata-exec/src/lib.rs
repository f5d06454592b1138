//! # strata-exec
//!
//! Parallel join engine and cursor core for Strata.
//!
//! This crate implements:
//! - Materialized views, records, headers and values
//! - Predicate expressions and a three-valued evaluator
//! - A process-wide worker governor and a partitioned task scheduler
//! - Cross, inner and outer nested-loop joins
//! - Declared and pseudo cursors with FETCH semantics

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Cancellation context
pub mod context;

/// Views, records, headers and registries
pub mod data;

/// Predicate expressions and evaluation
pub mod expr;

/// Worker governor, scheduler and record pool
pub mod parallel;

/// Join algorithms
pub mod join;

/// Cursors and the cursor registry
pub mod cursor;

pub use context::ExecContext;
pub use cursor::{Cursor, CursorRegistry, CursorSource, FetchPosition, QueryEngine};
pub use data::{FieldRef, Header, HeaderField, Record, Ternary, Value, View, ViewRegistry};
pub use expr::{DefaultEvaluator, Evaluator, Expr, RowScope};
pub use join::{JoinDirection, JoinEngine, JoinQualifier, JoinSpec, JoinType};
pub use parallel::{CapacityGovernor, RecordPool, TaskScheduler};
