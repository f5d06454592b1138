//! System-wide constants for Strata.

// =============================================================================
// Scheduling
// =============================================================================

/// Default minimum number of records per worker before the governor grants
/// another worker.
pub const DEFAULT_MIN_RECORDS_PER_CORE: usize = 80;

/// Default number of rows a partition processes between checks of its
/// cancellation context.
pub const DEFAULT_CANCELLATION_POLL_INTERVAL: usize = 16;

// =============================================================================
// Memory
// =============================================================================

/// Default number of idle record buffers a pool retains per width.
pub const DEFAULT_RECORD_POOL_LIMIT: usize = 4096;

// =============================================================================
// Cursors
// =============================================================================

/// Column name used for the single column of a pseudo cursor.
pub const PSEUDO_CURSOR_COLUMN: &str = "c1";

/// Index of a freshly opened cursor, positioned before the first row.
pub const CURSOR_BEFORE_FIRST: i64 = -1;
