//! Reusable scratch records.
//!
//! Join workers evaluate their condition against a merged scratch record
//! for every candidate pair. The pool hands out records of a given width
//! and takes them back scrubbed, so a worker allocates at most one scratch
//! record per operation.
//!
//! Records are keyed by width. A released record is kept only while its
//! width class holds fewer than `limit` records; past that it is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use strata_common::{ExecutionConfig, DEFAULT_RECORD_POOL_LIMIT};

use crate::data::Record;

/// Thread-safe free list of scratch records keyed by width.
#[derive(Debug)]
pub struct RecordPool {
    free: Mutex<HashMap<usize, Vec<Record>>>,
    limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecordPool {
    /// Creates a pool that retains at most `limit` idle records per width.
    pub fn new(limit: usize) -> Self {
        Self {
            free: Mutex::new(HashMap::new()),
            limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a pool sized from the configuration.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.record_pool_limit)
    }

    /// Returns a record of `width` NULL cells.
    pub fn acquire(&self, width: usize) -> Record {
        let reused = self.free.lock().get_mut(&width).and_then(Vec::pop);
        match reused {
            Some(record) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                record
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Record::nulls(width)
            }
        }
    }

    /// Returns `record` to the pool.
    pub fn release(&self, mut record: Record) {
        record.scrub();
        let mut free = self.free.lock();
        let bucket = free.entry(record.len()).or_default();
        if bucket.len() < self.limit {
            bucket.push(record);
        }
    }

    /// Returns the number of available records.
    pub fn available(&self) -> usize {
        self.free.lock().values().map(Vec::len).sum()
    }

    /// Returns the maximum number of idle records per width.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns usage counters.
    pub fn stats(&self) -> RecordPoolStats {
        RecordPoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            available: self.available(),
        }
    }

    /// Drops every available record.
    pub fn clear(&self) {
        self.free.lock().clear();
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_POOL_LIMIT)
    }
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPoolStats {
    /// Acquisitions served from the free list.
    pub hits: u64,
    /// Acquisitions that allocated a new record.
    pub misses: u64,
    /// Records currently idle.
    pub available: usize,
}

impl RecordPoolStats {
    /// Returns the fraction of acquisitions served from the free list.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
