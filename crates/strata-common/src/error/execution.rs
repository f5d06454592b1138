//! Execution error types.
//!
//! Every error carries a human readable message and a stable numeric
//! [`ErrorCode`]. Callers map errors to a process status through
//! [`StrataError::return_code`] instead of parsing message text.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// The high byte selects the category. Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,
    /// Unexpected runtime fault caught inside a worker.
    Fatal = 0x0010,

    // Cancellation (0x0100 - 0x01FF)
    /// The operation context was canceled by its owner.
    ContextCanceled = 0x0100,
    /// The operation context passed its deadline.
    ContextDone = 0x0101,

    // Declaration errors (0x0200 - 0x02FF)
    /// A cursor with the same name already exists.
    CursorRedeclared = 0x0200,
    /// A view with the same identifier already exists.
    ViewRedeclared = 0x0201,

    // State errors (0x0300 - 0x03FF)
    /// Cursor is not declared.
    UndeclaredCursor = 0x0300,
    /// Cursor is closed.
    CursorClosed = 0x0301,
    /// Cursor is already open.
    CursorOpen = 0x0302,
    /// Operation is not allowed on a pseudo cursor.
    PseudoCursor = 0x0303,
    /// Prepared statement cannot back a cursor.
    InvalidCursorStatement = 0x0304,
    /// Prepared statement does not exist.
    StatementNotExist = 0x0305,
    /// Fetched row width differs from the number of targets.
    CursorFetchLength = 0x0306,
    /// View is not loaded in the registry.
    ViewNotLoaded = 0x0307,

    // Schema errors (0x0400 - 0x04FF)
    /// Field reference matches more than one field.
    FieldAmbiguous = 0x0400,
    /// Field reference matches no field.
    FieldNotExist = 0x0401,

    // Evaluation errors (0x0500 - 0x05FF)
    /// Expression evaluation failed.
    Evaluation = 0x0500,
    /// Operands cannot be compared or combined.
    TypeMismatch = 0x0501,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Cancellation",
            0x02 => "Declaration",
            0x03 => "State",
            0x04 => "Schema",
            0x05 => "Evaluation",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Process status codes reported to the surrounding executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    /// A user or application level error.
    ApplicationError = 1,
    /// A bug or runtime fault.
    InternalError = 2,
    /// The operation was canceled or timed out.
    ContextDone = 4,
}

impl ReturnCode {
    /// Returns the numeric status.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// The main error type for Strata.
#[derive(Debug, Error)]
pub enum StrataError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// A worker hit an unexpected runtime fault.
    #[error("fatal error: {message}\n\nstack:\n{trace}")]
    Fatal {
        /// The panic payload rendered as text.
        message: String,
        /// Captured backtrace.
        trace: String,
    },

    // ==========================================================================
    // Cancellation
    // ==========================================================================
    /// The operation context was canceled.
    #[error("context canceled: {message}")]
    ContextCanceled {
        /// Error message.
        message: String,
    },

    /// The operation context passed its deadline.
    #[error("context deadline exceeded: {message}")]
    ContextDone {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Declaration Errors
    // ==========================================================================
    /// Cursor is declared twice.
    #[error("cursor {name} is redeclared")]
    CursorRedeclared {
        /// Cursor name.
        name: String,
    },

    /// View is stored twice.
    #[error("view {identifier} is redeclared")]
    ViewRedeclared {
        /// View identifier.
        identifier: String,
    },

    // ==========================================================================
    // State Errors
    // ==========================================================================
    /// Cursor is not declared.
    #[error("cursor {name} is undeclared")]
    UndeclaredCursor {
        /// Cursor name.
        name: String,
    },

    /// Cursor is closed.
    #[error("cursor {name} is closed")]
    CursorClosed {
        /// Cursor name.
        name: String,
    },

    /// Cursor is already open.
    #[error("cursor {name} is already open")]
    CursorOpen {
        /// Cursor name.
        name: String,
    },

    /// Operation not permitted on a pseudo cursor.
    #[error("cursor {name} is a pseudo cursor")]
    PseudoCursor {
        /// Cursor name.
        name: String,
    },

    /// Prepared statement cannot back a cursor.
    #[error("invalid cursor statement: {statement}")]
    InvalidCursorStatement {
        /// Statement name.
        statement: String,
    },

    /// Prepared statement does not exist.
    #[error("statement {statement} does not exist")]
    StatementNotExist {
        /// Statement name.
        statement: String,
    },

    /// Fetched row width differs from the number of targets.
    #[error("fetching from cursor {name} returns {actual} values, expected {expected}")]
    CursorFetchLength {
        /// Cursor name.
        name: String,
        /// Number of fetch targets.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// View is not loaded.
    #[error("view {identifier} is not loaded")]
    ViewNotLoaded {
        /// View identifier.
        identifier: String,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// Field reference is ambiguous.
    #[error("field {field} is ambiguous")]
    FieldAmbiguous {
        /// Field reference as written.
        field: String,
    },

    /// Field reference matches nothing.
    #[error("field {field} does not exist")]
    FieldNotExist {
        /// Field reference as written.
        field: String,
    },

    // ==========================================================================
    // Evaluation Errors
    // ==========================================================================
    /// Expression evaluation failed.
    #[error("evaluation failed: {message}")]
    Evaluation {
        /// Error message.
        message: String,
    },

    /// Operand types cannot be combined.
    #[error("type mismatch: cannot compare {left} with {right}")]
    TypeMismatch {
        /// Left operand type.
        left: String,
        /// Right operand type.
        right: String,
    },
}

impl StrataError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Fatal { .. } => ErrorCode::Fatal,
            Self::ContextCanceled { .. } => ErrorCode::ContextCanceled,
            Self::ContextDone { .. } => ErrorCode::ContextDone,
            Self::CursorRedeclared { .. } => ErrorCode::CursorRedeclared,
            Self::ViewRedeclared { .. } => ErrorCode::ViewRedeclared,
            Self::UndeclaredCursor { .. } => ErrorCode::UndeclaredCursor,
            Self::CursorClosed { .. } => ErrorCode::CursorClosed,
            Self::CursorOpen { .. } => ErrorCode::CursorOpen,
            Self::PseudoCursor { .. } => ErrorCode::PseudoCursor,
            Self::InvalidCursorStatement { .. } => ErrorCode::InvalidCursorStatement,
            Self::StatementNotExist { .. } => ErrorCode::StatementNotExist,
            Self::CursorFetchLength { .. } => ErrorCode::CursorFetchLength,
            Self::ViewNotLoaded { .. } => ErrorCode::ViewNotLoaded,
            Self::FieldAmbiguous { .. } => ErrorCode::FieldAmbiguous,
            Self::FieldNotExist { .. } => ErrorCode::FieldNotExist,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
        }
    }

    /// Returns the process status this error maps to.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::ContextCanceled { .. } | Self::ContextDone { .. } => ReturnCode::ContextDone,
            Self::Internal { .. } => ReturnCode::InternalError,
            _ => ReturnCode::ApplicationError,
        }
    }

    /// Returns true if this error comes from a canceled or expired context.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::ContextCanceled { .. } | Self::ContextDone { .. })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Creates a fatal error from a panic message and a rendered backtrace.
    #[must_use]
    pub fn fatal(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
            trace: trace.into(),
        }
    }
}
