//! Integration tests for cursors backed by joined views.

use std::collections::HashMap;

use strata_common::{ExecutionConfig, ReturnCode, StrataError, StrataResult};
use strata_exec::cursor::{PreparedStatement, SelectQuery, Statement};
use strata_exec::{
    CursorRegistry, CursorSource, ExecContext, FetchPosition, JoinEngine, JoinQualifier,
    JoinSpec, QueryEngine, Ternary, Value, View, ViewRegistry,
};

/// Answers `SELECT * FROM a` and `SELECT * FROM a NATURAL JOIN b` from a
/// view registry.
struct ViewEngine {
    views: ViewRegistry,
    joins: JoinEngine,
    statements: HashMap<String, PreparedStatement>,
}

impl ViewEngine {
    fn new() -> Self {
        let views = ViewRegistry::new();
        views
            .store(
                "users",
                View::from_values(
                    "users",
                    &["id", "name"],
                    vec![
                        vec![Value::int(1), Value::string("ann")],
                        vec![Value::int(2), Value::string("bob")],
                        vec![Value::int(3), Value::string("cid")],
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        views
            .store(
                "orders",
                View::from_values(
                    "orders",
                    &["oid", "id"],
                    vec![
                        vec![Value::int(10), Value::int(1)],
                        vec![Value::int(11), Value::int(3)],
                        vec![Value::int(12), Value::int(1)],
                    ],
                )
                .unwrap(),
            )
            .unwrap();

        let mut statements = HashMap::new();
        statements.insert(
            "all_users".to_string(),
            PreparedStatement::new(
                "all_users",
                vec![Statement::Select(SelectQuery::new("SELECT * FROM users"))],
            ),
        );

        Self {
            views,
            joins: JoinEngine::new(ExecutionConfig::builder().cpu(2).build()),
            statements,
        }
    }
}

impl QueryEngine for ViewEngine {
    fn execute_select(&self, ctx: &ExecContext, query: &SelectQuery) -> StrataResult<View> {
        let from = query
            .text
            .strip_prefix("SELECT * FROM ")
            .ok_or_else(|| StrataError::evaluation(format!("unsupported query: {}", query)))?;

        let mut tables = from.split(" NATURAL JOIN ");
        let first = tables.next().unwrap_or_default();
        let mut view = self.views.load(first)?;
        for table in tables {
            let join_view = self.views.load(table)?;
            self.joins.join_views(
                ctx,
                &mut view,
                &join_view,
                &JoinSpec::inner(JoinQualifier::Natural),
            )?;
        }
        Ok(view)
    }

    fn prepared_statement(&self, name: &str) -> Option<PreparedStatement> {
        self.statements.get(name).cloned()
    }
}

#[test]
fn test_cursor_over_join() {
    let engine = ViewEngine::new();
    let cursors = CursorRegistry::new();
    let ctx = ExecContext::new();

    cursors
        .declare(
            "orders_cur",
            CursorSource::Query(SelectQuery::new("SELECT * FROM users NATURAL JOIN orders")),
        )
        .unwrap();
    cursors.open(&ctx, "ORDERS_CUR", &engine).unwrap();
    assert_eq!(cursors.count("orders_cur").unwrap(), 3);

    let mut slots = vec![Value::Null; 3];
    let mut fetched = Vec::new();
    while cursors
        .fetch_into("orders_cur", FetchPosition::Next, &mut slots)
        .unwrap()
    {
        fetched.push(slots.clone());
    }
    assert_eq!(
        fetched,
        vec![
            vec![Value::int(1), Value::string("ann"), Value::int(10)],
            vec![Value::int(1), Value::string("ann"), Value::int(12)],
            vec![Value::int(3), Value::string("cid"), Value::int(11)],
        ]
    );
    assert_eq!(cursors.is_in_range("orders_cur").unwrap(), Ternary::False);

    // The registry's views are untouched by the join.
    assert_eq!(engine.views.load("users").unwrap().field_len(), 2);
}

#[test]
fn test_prepared_statement_cursor() {
    let engine = ViewEngine::new();
    let cursors = CursorRegistry::new();
    let ctx = ExecContext::new();

    cursors
        .declare("u", CursorSource::Statement("all_users".to_string()))
        .unwrap();
    cursors
        .declare("missing", CursorSource::Statement("nope".to_string()))
        .unwrap();

    cursors.open(&ctx, "u", &engine).unwrap();
    assert_eq!(
        cursors.fetch("u", FetchPosition::Last).unwrap(),
        Some(vec![Value::int(3), Value::string("cid")])
    );

    let err = cursors.open(&ctx, "missing", &engine).unwrap_err();
    assert!(matches!(err, StrataError::StatementNotExist { .. }));
    assert_eq!(err.return_code(), ReturnCode::ApplicationError);
}

#[test]
fn test_pseudo_cursor_walk() {
    let cursors = CursorRegistry::new();
    cursors
        .add_pseudo("p", vec![Value::int(10), Value::int(20), Value::int(30)])
        .unwrap();

    assert_eq!(cursors.count("p").unwrap(), 3);
    assert_eq!(cursors.fetch("p", FetchPosition::First).unwrap(), Some(vec![Value::int(10)]));
    assert_eq!(cursors.fetch("p", FetchPosition::Next).unwrap(), Some(vec![Value::int(20)]));
    assert_eq!(cursors.fetch("p", FetchPosition::Last).unwrap(), Some(vec![Value::int(30)]));
    assert_eq!(cursors.fetch("p", FetchPosition::Next).unwrap(), None);
    assert_eq!(cursors.is_in_range("p").unwrap(), Ternary::False);

    assert!(matches!(cursors.close("p"), Err(StrataError::PseudoCursor { .. })));
    assert!(matches!(cursors.dispose("p"), Err(StrataError::PseudoCursor { .. })));
}

#[test]
fn test_canceled_open_keeps_cursor_closed() {
    let engine = ViewEngine::new();
    let cursors = CursorRegistry::new();
    let ctx = ExecContext::new();
    ctx.cancel();

    cursors
        .declare(
            "c",
            CursorSource::Query(SelectQuery::new("SELECT * FROM users NATURAL JOIN orders")),
        )
        .unwrap();

    let err = cursors.open(&ctx, "c", &engine).unwrap_err();
    assert_eq!(err.return_code(), ReturnCode::ContextDone);
    assert_eq!(cursors.is_open("c").unwrap(), Ternary::False);
}
