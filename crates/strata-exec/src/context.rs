//! Execution context.
//!
//! An `ExecContext` carries the cancellation state of one operation: a
//! cancellation token and an optional deadline. Child contexts take a child
//! token, so canceling a parent cancels its children but not the reverse.
//! Clones share the token, so a context can be handed to every partition
//! task and canceled from any thread.

use std::time::{Duration, Instant};

use strata_common::{ExecutionConfig, StrataError};
use tokio_util::sync::CancellationToken;

/// Cancellation handle for one operation.
#[derive(Debug, Clone)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// Creates a context that is never done unless canceled.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Creates a context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Creates a context from the configured per-operation timeout.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        match config.query_timeout_ms {
            Some(ms) => Self::with_timeout(Duration::from_millis(ms)),
            None => Self::new(),
        }
    }

    /// Creates a child context. Canceling the parent also cancels the child,
    /// and the child keeps the parent's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Creates a child context whose deadline is the earlier of the
    /// parent's and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(own, |parent| parent.min(own))),
        }
    }

    /// Returns the underlying cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true if the context was canceled or its deadline passed.
    pub fn is_done(&self) -> bool {
        self.done_reason().is_some()
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the reason this context is done, or `None` while it is live.
    ///
    /// Explicit cancellation reports `ContextCanceled`; an expired deadline
    /// reports `ContextDone`.
    pub fn err(&self) -> Option<StrataError> {
        self.done_reason().map(|reason| match reason {
            DoneReason::Canceled => StrataError::ContextCanceled {
                message: "context canceled".to_string(),
            },
            DoneReason::DeadlineExceeded => StrataError::ContextDone {
                message: "context deadline exceeded".to_string(),
            },
        })
    }

    fn done_reason(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            return Some(DoneReason::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DoneReason {
    Canceled,
    DeadlineExceeded,
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}
