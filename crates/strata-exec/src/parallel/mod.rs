//! Intra-operation parallelism.
//!
//! - [`CapacityGovernor`]: process-wide worker budget
//! - [`TaskScheduler`]: per-operation partitioning, fan-out and error latch
//! - [`RecordPool`]: reusable scratch records for workers

mod governor;
mod pool;
mod scheduler;

pub use governor::CapacityGovernor;
pub use pool::{RecordPool, RecordPoolStats};
pub use scheduler::{fatal_from_panic, is_poll_tick, ErrorLatch, Partition, TaskScheduler};
