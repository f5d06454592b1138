//! # strata-common
//!
//! Common errors, configuration, and constants for Strata.
//!
//! This crate provides the foundational types shared by all Strata
//! components:
//!
//! - **Errors**: Unified error handling with `StrataError` and stable codes
//! - **Config**: Execution configuration (worker budget, polling, pooling)
//! - **Constants**: System-wide defaults
//!
//! ## Example
//!
//! ```rust
//! use strata_common::error::{StrataError, StrataResult};
//!
//! fn close(name: &str) -> StrataResult<()> {
//!     Err(StrataError::CursorClosed { name: name.to_string() })
//! }
//!
//! assert!(close("cur").is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used items at the crate root
pub use config::ExecutionConfig;
pub use constants::*;
pub use error::{ErrorCode, ReturnCode, StrataError, StrataResult};
