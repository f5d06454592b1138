//! Tabular data types.
//!
//! - **Value**: one cell, plus three-valued `Ternary` logic
//! - **Record**: a fixed-width row, also used as a reusable buffer
//! - **Header**: field descriptors with name resolution
//! - **View**: a materialized result (header + records)
//! - **ViewRegistry**: identifier to view store

mod header;
mod record;
mod registry;
mod value;
mod view;

pub use header::*;
pub use record::*;
pub use registry::*;
pub use value::*;
pub use view::*;
