//! Process-wide worker budget.
//!
//! The governor tracks how many extra workers are currently reserved so
//! that operations running at the same time (for example nested subqueries)
//! do not collectively ask for more workers than there are cores. Grants
//! are advisory: every caller always gets at least one worker, its own
//! thread.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use strata_common::{ExecutionConfig, DEFAULT_MIN_RECORDS_PER_CORE};

/// Shared worker reservation counter.
///
/// Create one per process and share it through an `Arc`.
///
/// # Example
///
/// ```rust
/// use strata_exec::parallel::CapacityGovernor;
///
/// let governor = CapacityGovernor::new(80);
/// let workers = governor.reserve(1_000, None, 4);
/// assert_eq!(workers, 4);
/// assert_eq!(governor.reserved(), 3);
/// for _ in 1..workers {
///     governor.release();
/// }
/// assert_eq!(governor.reserved(), 0);
/// ```
#[derive(Debug)]
pub struct CapacityGovernor {
    /// Extra workers currently reserved.
    reserved: Mutex<usize>,
    /// Default minimum records per worker.
    min_records_per_core: AtomicUsize,
}

impl CapacityGovernor {
    /// Creates a governor with the given default threshold.
    pub fn new(min_records_per_core: usize) -> Self {
        Self {
            reserved: Mutex::new(0),
            min_records_per_core: AtomicUsize::new(min_records_per_core.max(1)),
        }
    }

    /// Creates a governor from the execution configuration.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.min_records_per_core)
    }

    /// Returns the default minimum records per worker.
    pub fn min_records_per_core(&self) -> usize {
        self.min_records_per_core.load(Ordering::Relaxed)
    }

    /// Changes the default minimum records per worker.
    pub fn set_min_records_per_core(&self, min: usize) {
        self.min_records_per_core.store(min.max(1), Ordering::Relaxed);
    }

    /// Returns the number of extra workers currently reserved.
    pub fn reserved(&self) -> usize {
        *self.reserved.lock()
    }

    /// Reserves workers for an operation over `record_count` records.
    ///
    /// `min_per_core` overrides the default threshold when it is positive.
    /// Returns the granted worker count (at least 1). The caller must call
    /// [`release`](Self::release) once for every granted worker beyond the
    /// first.
    pub fn reserve(&self, record_count: usize, min_per_core: Option<usize>, cores: usize) -> usize {
        let min = match min_per_core {
            Some(min) if min > 0 => min,
            _ => self.min_records_per_core(),
        };
        let ideal = (record_count / min).max(1).min(cores.max(1));

        let mut reserved = self.reserved.lock();
        let granted = ideal.saturating_sub(*reserved).max(1);
        *reserved += granted - 1;
        granted
    }

    /// Returns one extra worker to the budget.
    pub fn release(&self) {
        let mut reserved = self.reserved.lock();
        if *reserved > 0 {
            *reserved -= 1;
        }
    }
}

impl Default for CapacityGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RECORDS_PER_CORE)
    }
}
