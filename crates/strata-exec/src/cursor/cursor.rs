//! Positional cursors over materialized results.

use std::fmt;

use parking_lot::Mutex;
use strata_common::{StrataError, StrataResult, CURSOR_BEFORE_FIRST, PSEUDO_CURSOR_COLUMN};

use super::source::{CursorSource, QueryEngine, SelectQuery};
use crate::context::ExecContext;
use crate::data::{Header, Record, Ternary, Value, View};

/// Target of a FETCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchPosition {
    /// The row after the current one.
    #[default]
    Next,
    /// The row before the current one.
    Prior,
    /// The first row.
    First,
    /// The last row.
    Last,
    /// The row at a 0-based position.
    Absolute(i64),
    /// The row at an offset from the current one.
    Relative(i64),
}

impl fmt::Display for FetchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPosition::Next => write!(f, "NEXT"),
            FetchPosition::Prior => write!(f, "PRIOR"),
            FetchPosition::First => write!(f, "FIRST"),
            FetchPosition::Last => write!(f, "LAST"),
            FetchPosition::Absolute(n) => write!(f, "ABSOLUTE {}", n),
            FetchPosition::Relative(n) => write!(f, "RELATIVE {}", n),
        }
    }
}

#[derive(Debug)]
enum CursorState {
    Closed,
    Open {
        view: View,
        index: i64,
        fetched: bool,
    },
}

impl CursorState {
    fn opened(view: View) -> Self {
        CursorState::Open {
            view,
            index: CURSOR_BEFORE_FIRST,
            fetched: false,
        }
    }
}

/// A named cursor.
///
/// A declared cursor starts closed and may be opened and closed any number
/// of times; each open runs its source again. A pseudo cursor is built once
/// from a list of values, is always open, and cannot be opened, closed or
/// disposed.
#[derive(Debug)]
pub struct Cursor {
    name: String,
    source: Option<CursorSource>,
    state: Mutex<CursorState>,
}

impl Cursor {
    /// Creates a closed cursor over `source`.
    pub fn new(name: impl Into<String>, source: CursorSource) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
            state: Mutex::new(CursorState::Closed),
        }
    }

    /// Creates a closed cursor over a SELECT query.
    pub fn with_query(name: impl Into<String>, query: SelectQuery) -> Self {
        Self::new(name, CursorSource::Query(query))
    }

    /// Creates a closed cursor over a prepared statement.
    pub fn with_statement(name: impl Into<String>, statement: impl Into<String>) -> Self {
        Self::new(name, CursorSource::Statement(statement.into()))
    }

    /// Creates an open pseudo cursor with one single-column row per value.
    pub fn pseudo(name: impl Into<String>, values: Vec<Value>) -> Self {
        let header = Header::new("", &[PSEUDO_CURSOR_COLUMN]);
        let records = values.into_iter().map(|v| Record::new(vec![v])).collect();
        let mut view = View::default();
        view.replace(header, records);
        Self {
            name: name.into(),
            source: None,
            state: Mutex::new(CursorState::opened(view)),
        }
    }

    /// Returns the cursor name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source of a declared cursor.
    pub fn source(&self) -> Option<&CursorSource> {
        self.source.as_ref()
    }

    /// Returns true for pseudo cursors.
    pub fn is_pseudo(&self) -> bool {
        self.source.is_none()
    }

    /// Runs the cursor's source and positions the cursor before the first
    /// row.
    pub fn open(&self, ctx: &ExecContext, engine: &dyn QueryEngine) -> StrataResult<()> {
        let Some(source) = &self.source else {
            return Err(self.pseudo_error());
        };
        if self.is_open_locked() {
            return Err(self.open_error());
        }

        let view = match source {
            CursorSource::Query(query) => engine.execute_select(ctx, query)?,
            CursorSource::Statement(name) => {
                let stmt = engine
                    .prepared_statement(name)
                    .ok_or_else(|| StrataError::StatementNotExist {
                        statement: name.clone(),
                    })?;
                let query = stmt
                    .single_select()
                    .ok_or_else(|| StrataError::InvalidCursorStatement {
                        statement: name.clone(),
                    })?;
                engine.execute_select(ctx, query)?
            }
        };

        let mut state = self.state.lock();
        if matches!(*state, CursorState::Open { .. }) {
            return Err(self.open_error());
        }
        tracing::trace!(cursor = %self.name, rows = view.record_len(), "cursor opened");
        *state = CursorState::opened(view);
        Ok(())
    }

    /// Releases the cursor's result. Closing a closed cursor is a no-op.
    pub fn close(&self) -> StrataResult<()> {
        if self.is_pseudo() {
            return Err(self.pseudo_error());
        }
        let mut state = self.state.lock();
        if matches!(*state, CursorState::Open { .. }) {
            tracing::trace!(cursor = %self.name, "cursor closed");
        }
        *state = CursorState::Closed;
        Ok(())
    }

    /// Moves the cursor and returns the row at the new position.
    ///
    /// Moving before the first row leaves the cursor at -1 and moving past
    /// the last row leaves it at the row count; both return `None`.
    pub fn fetch(&self, position: FetchPosition) -> StrataResult<Option<Vec<Value>>> {
        let mut state = self.state.lock();
        let CursorState::Open {
            view,
            index,
            fetched,
        } = &mut *state
        else {
            return Err(self.closed_error());
        };

        *fetched = true;
        let count = view.record_len() as i64;
        *index = match position {
            FetchPosition::Absolute(n) => n,
            FetchPosition::Relative(n) => index.saturating_add(n),
            FetchPosition::First => 0,
            FetchPosition::Last => count - 1,
            FetchPosition::Prior => index.saturating_sub(1),
            FetchPosition::Next => index.saturating_add(1),
        };

        if *index < 0 {
            *index = CURSOR_BEFORE_FIRST;
            return Ok(None);
        }
        if *index >= count {
            *index = count;
            return Ok(None);
        }
        Ok(view
            .record(*index as usize)
            .map(|record| record.cells().to_vec()))
    }

    /// Fetches into `slots`. Returns false when no row was fetched.
    ///
    /// Fails with `CursorFetchLength` when the row is not exactly as wide
    /// as `slots`; the slots are left untouched.
    pub fn fetch_into(&self, position: FetchPosition, slots: &mut [Value]) -> StrataResult<bool> {
        let Some(row) = self.fetch(position)? else {
            return Ok(false);
        };
        if row.len() != slots.len() {
            return Err(StrataError::CursorFetchLength {
                name: self.name.clone(),
                expected: slots.len(),
                actual: row.len(),
            });
        }
        for (slot, value) in slots.iter_mut().zip(row) {
            *slot = value;
        }
        Ok(true)
    }

    /// Returns TRUE if the cursor is open.
    pub fn is_open(&self) -> Ternary {
        Ternary::from_bool(self.is_open_locked())
    }

    /// Returns whether the current position is on a row.
    ///
    /// UNKNOWN until the first fetch after opening.
    pub fn is_in_range(&self) -> StrataResult<Ternary> {
        match &*self.state.lock() {
            CursorState::Closed => Err(self.closed_error()),
            CursorState::Open { fetched: false, .. } => Ok(Ternary::Unknown),
            CursorState::Open { view, index, .. } => Ok(Ternary::from_bool(
                CURSOR_BEFORE_FIRST < *index && *index < view.record_len() as i64,
            )),
        }
    }

    /// Returns the number of rows in the open result.
    pub fn count(&self) -> StrataResult<usize> {
        match &*self.state.lock() {
            CursorState::Closed => Err(self.closed_error()),
            CursorState::Open { view, .. } => Ok(view.record_len()),
        }
    }

    /// Returns the current position, or `None` when closed.
    pub fn position(&self) -> Option<i64> {
        match &*self.state.lock() {
            CursorState::Closed => None,
            CursorState::Open { index, .. } => Some(*index),
        }
    }

    fn is_open_locked(&self) -> bool {
        matches!(*self.state.lock(), CursorState::Open { .. })
    }

    fn pseudo_error(&self) -> StrataError {
        StrataError::PseudoCursor {
            name: self.name.clone(),
        }
    }

    fn open_error(&self) -> StrataError {
        StrataError::CursorOpen {
            name: self.name.clone(),
        }
    }

    fn closed_error(&self) -> StrataError {
        StrataError::CursorClosed {
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::source::mock::StaticEngine;
    use crate::cursor::source::{PreparedStatement, Statement};

    fn numbers(n: i64) -> View {
        View::from_values("t", &["n"], (0..n).map(|i| vec![Value::int(i)]).collect()).unwrap()
    }

    fn engine() -> StaticEngine {
        StaticEngine::default()
            .with_result("SELECT n FROM t", numbers(3))
            .with_statement(PreparedStatement::new(
                "stmt",
                vec![Statement::Select(SelectQuery::new("SELECT n FROM t"))],
            ))
            .with_statement(PreparedStatement::new(
                "multi",
                vec![
                    Statement::Select(SelectQuery::new("SELECT n FROM t")),
                    Statement::Select(SelectQuery::new("SELECT n FROM t")),
                ],
            ))
            .with_statement(PreparedStatement::new(
                "insert",
                vec![Statement::Other("INSERT INTO t VALUES (1)".to_string())],
            ))
    }

    fn opened() -> Cursor {
        let cursor = Cursor::with_query("cur", SelectQuery::new("SELECT n FROM t"));
        cursor.open(&ExecContext::new(), &engine()).unwrap();
        cursor
    }

    #[test]
    fn test_lifecycle() {
        let cursor = Cursor::with_query("cur", SelectQuery::new("SELECT n FROM t"));
        assert_eq!(cursor.is_open(), Ternary::False);
        assert!(matches!(cursor.count(), Err(StrataError::CursorClosed { .. })));
        assert!(matches!(
            cursor.fetch(FetchPosition::Next),
            Err(StrataError::CursorClosed { .. })
        ));

        cursor.open(&ExecContext::new(), &engine()).unwrap();
        assert_eq!(cursor.is_open(), Ternary::True);
        assert_eq!(cursor.count().unwrap(), 3);
        assert_eq!(cursor.position(), Some(-1));

        let err = cursor.open(&ExecContext::new(), &engine()).unwrap_err();
        assert!(matches!(err, StrataError::CursorOpen { .. }));

        cursor.close().unwrap();
        cursor.close().unwrap();
        assert_eq!(cursor.is_open(), Ternary::False);
        assert!(matches!(cursor.is_in_range(), Err(StrataError::CursorClosed { .. })));
    }

    #[test]
    fn test_reopen_resets_position() {
        let cursor = opened();
        cursor.fetch(FetchPosition::Last).unwrap();
        cursor.close().unwrap();
        cursor.open(&ExecContext::new(), &engine()).unwrap();
        assert_eq!(cursor.position(), Some(-1));
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::Unknown);
    }

    #[test]
    fn test_fetch_positions() {
        let cursor = opened();
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::Unknown);

        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), Some(vec![Value::int(0)]));
        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), Some(vec![Value::int(1)]));
        assert_eq!(cursor.fetch(FetchPosition::Prior).unwrap(), Some(vec![Value::int(0)]));
        assert_eq!(cursor.fetch(FetchPosition::Last).unwrap(), Some(vec![Value::int(2)]));
        assert_eq!(cursor.fetch(FetchPosition::First).unwrap(), Some(vec![Value::int(0)]));
        assert_eq!(
            cursor.fetch(FetchPosition::Relative(2)).unwrap(),
            Some(vec![Value::int(2)])
        );
        assert_eq!(
            cursor.fetch(FetchPosition::Absolute(1)).unwrap(),
            Some(vec![Value::int(1)])
        );
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::True);
    }

    #[test]
    fn test_fetch_clamping() {
        let cursor = opened();

        assert_eq!(cursor.fetch(FetchPosition::Absolute(-5)).unwrap(), None);
        assert_eq!(cursor.position(), Some(-1));
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::False);

        assert_eq!(cursor.fetch(FetchPosition::Absolute(10)).unwrap(), None);
        assert_eq!(cursor.position(), Some(3));
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::False);

        assert_eq!(cursor.fetch(FetchPosition::Prior).unwrap(), Some(vec![Value::int(2)]));
        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), None);
        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), None);
        assert_eq!(cursor.position(), Some(3));
    }

    #[test]
    fn test_fetch_into() {
        let cursor = opened();

        let mut slots = vec![Value::Null];
        assert!(cursor.fetch_into(FetchPosition::Next, &mut slots).unwrap());
        assert_eq!(slots, vec![Value::int(0)]);

        let mut wide = vec![Value::Null, Value::Null];
        let err = cursor.fetch_into(FetchPosition::Next, &mut wide).unwrap_err();
        assert!(matches!(
            err,
            StrataError::CursorFetchLength {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(wide, vec![Value::Null, Value::Null]);

        assert!(!cursor
            .fetch_into(FetchPosition::Absolute(9), &mut wide)
            .unwrap());
    }

    #[test]
    fn test_prepared_statement_source() {
        let ctx = ExecContext::new();
        let engine = engine();

        let cursor = Cursor::with_statement("cur", "stmt");
        cursor.open(&ctx, &engine).unwrap();
        assert_eq!(cursor.count().unwrap(), 3);

        let err = Cursor::with_statement("cur", "missing")
            .open(&ctx, &engine)
            .unwrap_err();
        assert!(matches!(err, StrataError::StatementNotExist { .. }));

        for name in ["multi", "insert"] {
            let cursor = Cursor::with_statement("cur", name);
            let err = cursor.open(&ctx, &engine).unwrap_err();
            assert!(matches!(err, StrataError::InvalidCursorStatement { .. }));
            assert_eq!(cursor.is_open(), Ternary::False);
        }
    }

    #[test]
    fn test_query_error_leaves_cursor_closed() {
        let cursor = Cursor::with_query("cur", SelectQuery::new("SELECT broken"));
        let err = cursor.open(&ExecContext::new(), &engine()).unwrap_err();
        assert!(matches!(err, StrataError::Evaluation { .. }));
        assert_eq!(cursor.is_open(), Ternary::False);
    }

    #[test]
    fn test_pseudo_cursor() {
        let cursor = Cursor::pseudo("p", vec![Value::int(10), Value::int(20), Value::int(30)]);
        assert!(cursor.is_pseudo());
        assert_eq!(cursor.is_open(), Ternary::True);
        assert_eq!(cursor.count().unwrap(), 3);

        assert_eq!(cursor.fetch(FetchPosition::First).unwrap(), Some(vec![Value::int(10)]));
        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), Some(vec![Value::int(20)]));
        assert_eq!(cursor.fetch(FetchPosition::Last).unwrap(), Some(vec![Value::int(30)]));
        assert_eq!(cursor.fetch(FetchPosition::Next).unwrap(), None);
        assert_eq!(cursor.is_in_range().unwrap(), Ternary::False);

        assert!(matches!(
            cursor.open(&ExecContext::new(), &engine()),
            Err(StrataError::PseudoCursor { .. })
        ));
        assert!(matches!(cursor.close(), Err(StrataError::PseudoCursor { .. })));
    }

    #[test]
    fn test_concurrent_fetch() {
        let cursor = Cursor::pseudo("p", (0..1000).map(Value::int).collect());
        let fetched = std::sync::atomic::AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while cursor.fetch(FetchPosition::Next).unwrap().is_some() {
                        fetched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(fetched.into_inner(), 1000);
    }
}
