//! Strata Performance Benchmarks
//!
//! This crate contains benchmarks for the Strata execution core:
//! - Cross, inner and outer joins at several worker budgets
//! - Cursor open and fetch
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p strata-bench
//! ```

pub mod utils;
