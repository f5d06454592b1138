//! Configuration for Strata.
//!
//! This module provides configuration structures for the execution core.

mod execution;

pub use execution::{ExecutionConfig, ExecutionConfigBuilder};
