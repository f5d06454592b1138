//! Expression evaluation.
//!
//! The join engine treats evaluation as a black box behind the
//! [`Evaluator`] trait. [`DefaultEvaluator`] implements SQL three-valued
//! semantics for the expressions in [`Expr`].

use std::cmp::Ordering;

use strata_common::{StrataError, StrataResult};

use super::{ComparisonOp, Expr, RowScope};
use crate::context::ExecContext;
use crate::data::{Ternary, Value};

/// Evaluates expressions against a single-row scope.
///
/// Implementations must be safe to call concurrently with distinct scopes.
pub trait Evaluator: Send + Sync {
    /// Evaluates `expr` to a value.
    fn evaluate(&self, ctx: &ExecContext, scope: &RowScope<'_>, expr: &Expr)
        -> StrataResult<Value>;

    /// Evaluates `expr` as a predicate.
    fn evaluate_predicate(
        &self,
        ctx: &ExecContext,
        scope: &RowScope<'_>,
        expr: &Expr,
    ) -> StrataResult<Ternary> {
        Ok(self.evaluate(ctx, scope, expr)?.to_ternary())
    }
}

/// Reference evaluator for field, literal, comparison and logical
/// expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEvaluator;

impl DefaultEvaluator {
    /// Creates a new evaluator.
    pub fn new() -> Self {
        Self
    }

    fn ternary(
        &self,
        ctx: &ExecContext,
        scope: &RowScope<'_>,
        expr: &Expr,
    ) -> StrataResult<Ternary> {
        match expr {
            Expr::Comparison { op, left, right } => {
                let left = self.evaluate(ctx, scope, left)?;
                let right = self.evaluate(ctx, scope, right)?;
                compare(*op, &left, &right)
            }
            Expr::And(left, right) => {
                let left = self.ternary(ctx, scope, left)?;
                if left == Ternary::False {
                    return Ok(Ternary::False);
                }
                Ok(left.and(self.ternary(ctx, scope, right)?))
            }
            Expr::Or(left, right) => {
                let left = self.ternary(ctx, scope, left)?;
                if left == Ternary::True {
                    return Ok(Ternary::True);
                }
                Ok(left.or(self.ternary(ctx, scope, right)?))
            }
            Expr::Not(expr) => Ok(self.ternary(ctx, scope, expr)?.not()),
            Expr::IsNull(expr) => Ok(Ternary::from_bool(
                self.evaluate(ctx, scope, expr)?.is_null(),
            )),
            Expr::Field(_) | Expr::Literal(_) => Ok(self.evaluate(ctx, scope, expr)?.to_ternary()),
        }
    }
}

impl Evaluator for DefaultEvaluator {
    fn evaluate(
        &self,
        ctx: &ExecContext,
        scope: &RowScope<'_>,
        expr: &Expr,
    ) -> StrataResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Field(field) => {
                let index = scope.header().search_index(field)?;
                let record = scope
                    .record()
                    .ok_or_else(|| StrataError::internal("no current record in scope"))?;
                Ok(record.get(index).cloned().unwrap_or(Value::Null))
            }
            _ => Ok(ternary_value(self.ternary(ctx, scope, expr)?)),
        }
    }

    fn evaluate_predicate(
        &self,
        ctx: &ExecContext,
        scope: &RowScope<'_>,
        expr: &Expr,
    ) -> StrataResult<Ternary> {
        self.ternary(ctx, scope, expr)
    }
}

fn compare(op: ComparisonOp, left: &Value, right: &Value) -> StrataResult<Ternary> {
    let Some(ordering) = left.sql_cmp(right)? else {
        return Ok(Ternary::Unknown);
    };
    let result = match op {
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::NotEq => ordering != Ordering::Equal,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::LtEq => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::GtEq => ordering != Ordering::Less,
    };
    Ok(Ternary::from_bool(result))
}

fn ternary_value(t: Ternary) -> Value {
    match t {
        Ternary::True => Value::Boolean(true),
        Ternary::False => Value::Boolean(false),
        Ternary::Unknown => Value::Null,
    }
}
