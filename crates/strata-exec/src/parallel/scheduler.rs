//! Partitioned task scheduler.
//!
//! A `TaskScheduler` is created per operation. It asks the
//! [`CapacityGovernor`] for a worker count once, splits `[0, record_count)`
//! into that many contiguous partitions and runs one task per partition.
//! Partition 0 always runs on the caller's thread; the others run on scoped
//! threads spawned for this operation only.
//!
//! Tasks stop cooperatively: before every row they check whether another
//! partition already failed, and every [`poll interval`](Partition::should_stop)
//! rows they check the cancellation context. Only the first error is kept.

use std::any::Any;
use std::backtrace::Backtrace;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::thread;

use strata_common::{StrataError, StrataResult, DEFAULT_CANCELLATION_POLL_INTERVAL};

use super::CapacityGovernor;
use crate::context::ExecContext;

/// Returns true when a partition should poll its context after processing
/// `counter` rows.
#[inline]
pub const fn is_poll_tick(counter: usize, interval: usize) -> bool {
    counter % interval == 0
}

/// Holds the first error raised by any partition of an operation.
#[derive(Debug, Default)]
pub struct ErrorLatch {
    slot: OnceLock<StrataError>,
}

impl ErrorLatch {
    /// Creates an empty latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `err` if no error was recorded yet. Returns true if `err`
    /// was kept.
    pub fn set(&self, err: StrataError) -> bool {
        self.slot.set(err).is_ok()
    }

    /// Returns true once an error has been recorded.
    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Consumes the latch and returns the recorded error.
    pub fn into_inner(self) -> Option<StrataError> {
        self.slot.into_inner()
    }
}

/// One partition as seen by its task.
#[derive(Debug)]
pub struct Partition<'a> {
    index: usize,
    range: Range<usize>,
    ctx: &'a ExecContext,
    latch: &'a ErrorLatch,
    poll_interval: usize,
}

impl<'a> Partition<'a> {
    /// Returns the partition index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the record range of this partition.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Returns the number of records in this partition.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns true if the partition holds no records.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns the operation's context.
    pub fn ctx(&self) -> &'a ExecContext {
        self.ctx
    }

    /// Returns true if the task should stop before record `index`.
    ///
    /// Stops as soon as any partition has latched an error, and on every
    /// poll tick when the context is done.
    pub fn should_stop(&self, index: usize) -> bool {
        if self.latch.is_set() {
            return true;
        }
        let processed = index.saturating_sub(self.range.start);
        is_poll_tick(processed, self.poll_interval) && self.ctx.is_done()
    }
}

/// Per-operation partitioned scheduler.
#[derive(Debug)]
pub struct TaskScheduler<'g> {
    governor: &'g CapacityGovernor,
    record_count: usize,
    workers: usize,
    poll_interval: usize,
}

impl<'g> TaskScheduler<'g> {
    /// Creates a scheduler and reserves its workers from `governor`.
    pub fn new(
        governor: &'g CapacityGovernor,
        record_count: usize,
        min_per_core: Option<usize>,
        cores: usize,
    ) -> Self {
        let workers = governor.reserve(record_count, min_per_core, cores);
        tracing::debug!(record_count, workers, "scheduler reserved workers");
        Self {
            governor,
            record_count,
            workers,
            poll_interval: DEFAULT_CANCELLATION_POLL_INTERVAL,
        }
    }

    /// Sets how many rows a partition processes between context checks.
    pub fn with_poll_interval(mut self, rows: usize) -> Self {
        self.poll_interval = rows.max(1);
        self
    }

    /// Returns the number of workers (and partitions).
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the number of records being partitioned.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Returns the `[start, end)` range of partition `index`.
    ///
    /// The last partition absorbs the remainder of the integer division.
    /// A partition that would start past the end is empty.
    pub fn partition_range(&self, index: usize) -> Range<usize> {
        let calc_len = self.record_count / self.workers;
        let start = index * calc_len;
        if start >= self.record_count {
            return 0..0;
        }
        let end = if index == self.workers - 1 {
            self.record_count
        } else {
            (index + 1) * calc_len
        };
        start..end
    }

    /// Runs `f` for every record index.
    pub fn run<F>(&self, ctx: &ExecContext, f: F) -> StrataResult<()>
    where
        F: Fn(usize) -> StrataResult<()> + Sync,
    {
        self.run_partitions(ctx, |partition| {
            for i in partition.range() {
                if partition.should_stop(i) {
                    break;
                }
                f(i)?;
            }
            Ok(())
        })
        .map(|_| ())
    }

    /// Runs `task` once per partition and returns the outputs in partition
    /// order.
    ///
    /// Returns the first error latched by any partition, otherwise the
    /// context's error if it is done, otherwise the outputs.
    pub fn run_partitions<T, F>(&self, ctx: &ExecContext, task: F) -> StrataResult<Vec<T>>
    where
        T: Send,
        F: Fn(&Partition<'_>) -> StrataResult<T> + Sync,
    {
        let latch = ErrorLatch::new();
        let mut outputs = Vec::with_capacity(self.workers);

        if self.workers == 1 {
            outputs.push(self.run_task(ctx, &latch, 0, &task));
        } else {
            thread::scope(|s| {
                let latch = &latch;
                let task = &task;
                let handles: Vec<_> = (1..self.workers)
                    .map(|index| {
                        s.spawn(move || {
                            let output = self.run_task(ctx, latch, index, task);
                            self.governor.release();
                            output
                        })
                    })
                    .collect();

                outputs.push(self.run_task(ctx, latch, 0, task));

                for handle in handles {
                    match handle.join() {
                        Ok(output) => outputs.push(output),
                        Err(payload) => {
                            latch.set(fatal_from_panic(payload.as_ref()));
                            outputs.push(None);
                        }
                    }
                }
            });
        }

        if let Some(err) = latch.into_inner() {
            return Err(err);
        }
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        outputs
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| StrataError::internal("partition finished without output"))
    }

    fn run_task<T, F>(
        &self,
        ctx: &ExecContext,
        latch: &ErrorLatch,
        index: usize,
        task: &F,
    ) -> Option<T>
    where
        F: Fn(&Partition<'_>) -> StrataResult<T> + Sync,
    {
        let partition = Partition {
            index,
            range: self.partition_range(index),
            ctx,
            latch,
            poll_interval: self.poll_interval,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| task(&partition))) {
            Ok(Ok(output)) => Some(output),
            Ok(Err(err)) => {
                latch.set(err);
                None
            }
            Err(payload) => {
                let err = fatal_from_panic(payload.as_ref());
                tracing::warn!(partition = index, "worker panicked: {}", err);
                latch.set(err);
                None
            }
        }
    }
}

/// Converts a panic payload into a `Fatal` error with a captured backtrace.
pub fn fatal_from_panic(payload: &(dyn Any + Send)) -> StrataError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    StrataError::fatal(message, Backtrace::force_capture().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    fn covered(scheduler: &TaskScheduler<'_>) -> Vec<usize> {
        (0..scheduler.workers())
            .flat_map(|i| scheduler.partition_range(i))
            .collect()
    }

    #[test]
    fn test_partition_coverage() {
        for count in [0usize, 1, 7, 16, 79, 80, 81, 159, 160, 161, 1000, 1003] {
            for cores in [1usize, 2, 3, 4, 7, 8] {
                let governor = CapacityGovernor::new(10);
                let scheduler = TaskScheduler::new(&governor, count, None, cores);
                let indices = covered(&scheduler);
                assert_eq!(indices, (0..count).collect::<Vec<_>>());

                let last_end = (0..scheduler.workers())
                    .map(|i| scheduler.partition_range(i))
                    .filter(|r| !r.is_empty())
                    .map(|r| r.end)
                    .last();
                if count > 0 {
                    assert_eq!(last_end, Some(count));
                }
            }
        }
    }

    #[test]
    fn test_partition_remainder_goes_last() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 10, None, 3);
        assert_eq!(scheduler.workers(), 3);
        assert_eq!(scheduler.partition_range(0), 0..3);
        assert_eq!(scheduler.partition_range(1), 3..6);
        assert_eq!(scheduler.partition_range(2), 6..10);
    }

    #[test]
    fn test_run_visits_every_index_once() {
        let governor = CapacityGovernor::new(4);
        let scheduler = TaskScheduler::new(&governor, 100, None, 4);
        assert_eq!(scheduler.workers(), 4);

        let seen = Mutex::new(Vec::new());
        scheduler
            .run(&ExecContext::new(), |i| {
                seen.lock().push(i);
                Ok(())
            })
            .unwrap();

        let mut seen = seen.into_inner();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_workers_released_after_run() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 64, None, 4);
        assert_eq!(governor.reserved(), 3);

        scheduler.run(&ExecContext::new(), |_| Ok(())).unwrap();
        assert_eq!(governor.reserved(), 0);
    }

    #[test]
    fn test_single_worker_runs_inline() {
        let governor = CapacityGovernor::new(80);
        let scheduler = TaskScheduler::new(&governor, 10, None, 8);
        assert_eq!(scheduler.workers(), 1);

        let caller = thread::current().id();
        scheduler
            .run(&ExecContext::new(), |_| {
                assert_eq!(thread::current().id(), caller);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_outputs_in_partition_order() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 40, None, 4);

        let outputs = scheduler
            .run_partitions(&ExecContext::new(), |p| Ok(p.range().collect::<Vec<_>>()))
            .unwrap();
        let flat: Vec<usize> = outputs.into_iter().flatten().collect();
        assert_eq!(flat, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_error_is_returned() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 400, None, 4);

        let raised = Mutex::new(HashSet::new());
        let err = scheduler
            .run(&ExecContext::new(), |i| {
                if i % 7 == 0 {
                    let message = format!("row {}", i);
                    raised.lock().insert(message.clone());
                    return Err(StrataError::evaluation(message));
                }
                Ok(())
            })
            .unwrap_err();

        match err {
            StrataError::Evaluation { message } => assert!(raised.lock().contains(&message)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_stops_other_partitions() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 4000, None, 4);
        assert_eq!(scheduler.workers(), 4);
        let visited = AtomicUsize::new(0);

        let err = scheduler
            .run_partitions(&ExecContext::new(), |partition| {
                if partition.index() == 0 {
                    return Err(StrataError::evaluation("stop"));
                }
                // Hold the first row until partition 0 has failed.
                while !partition.should_stop(partition.range().start) {
                    thread::yield_now();
                }
                for i in partition.range() {
                    if partition.should_stop(i) {
                        break;
                    }
                    visited.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, StrataError::Evaluation { .. }));
        assert_eq!(visited.load(Ordering::Relaxed), 0);
        assert_eq!(governor.reserved(), 0);
    }

    #[test]
    fn test_error_stops_partition_early() {
        let governor = CapacityGovernor::new(80);
        let scheduler = TaskScheduler::new(&governor, 1000, None, 1);
        let visited = AtomicUsize::new(0);

        let result = scheduler.run(&ExecContext::new(), |i| {
            visited.fetch_add(1, Ordering::Relaxed);
            if i == 10 {
                return Err(StrataError::evaluation("stop"));
            }
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(visited.load(Ordering::Relaxed), 11);
    }

    #[test]
    fn test_panic_becomes_fatal() {
        let governor = CapacityGovernor::new(1);
        let scheduler = TaskScheduler::new(&governor, 8, None, 2);

        let err = scheduler
            .run(&ExecContext::new(), |i| {
                if i == 5 {
                    panic!("worker exploded");
                }
                Ok(())
            })
            .unwrap_err();

        match err {
            StrataError::Fatal { message, .. } => assert_eq!(message, "worker exploded"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(governor.reserved(), 0);
    }

    #[test]
    fn test_cancellation_is_reported() {
        let governor = CapacityGovernor::new(80);
        let scheduler = TaskScheduler::new(&governor, 100, None, 1);
        let ctx = ExecContext::new();
        let visited = AtomicUsize::new(0);

        let err = scheduler
            .run(&ctx, |i| {
                visited.fetch_add(1, Ordering::Relaxed);
                if i == 3 {
                    ctx.cancel();
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, StrataError::ContextCanceled { .. }));
        // Cancellation is observed at the next poll tick, row 16.
        assert_eq!(visited.load(Ordering::Relaxed), 16);
    }

    #[test]
    fn test_latched_error_beats_cancellation() {
        let governor = CapacityGovernor::new(80);
        let scheduler = TaskScheduler::new(&governor, 100, None, 1);
        let ctx = ExecContext::new();

        let err = scheduler
            .run(&ctx, |i| {
                if i == 2 {
                    ctx.cancel();
                    return Err(StrataError::evaluation("user error"));
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, StrataError::Evaluation { .. }));
    }

    #[test]
    fn test_custom_poll_interval() {
        let governor = CapacityGovernor::new(80);
        let scheduler = TaskScheduler::new(&governor, 100, None, 1).with_poll_interval(4);
        let ctx = ExecContext::new();
        let visited = AtomicUsize::new(0);

        let result = scheduler.run(&ctx, |i| {
            visited.fetch_add(1, Ordering::Relaxed);
            if i == 0 {
                ctx.cancel();
            }
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(visited.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_is_poll_tick() {
        assert!(is_poll_tick(0, 16));
        assert!(!is_poll_tick(15, 16));
        assert!(is_poll_tick(32, 16));
    }
}
