//! Predicate expressions.
//!
//! Join conditions are expressed as `Expr` trees and evaluated row by row
//! through the [`Evaluator`] trait against a [`RowScope`].

mod evaluator;
mod scope;

use std::fmt;

use crate::data::{FieldRef, Value};

pub use evaluator::{DefaultEvaluator, Evaluator};
pub use scope::RowScope;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A predicate or scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field reference.
    Field(FieldRef),

    /// Literal value.
    Literal(Value),

    /// Binary comparison.
    Comparison {
        /// Operator.
        op: ComparisonOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },

    /// Logical AND.
    And(Box<Expr>, Box<Expr>),

    /// Logical OR.
    Or(Box<Expr>, Box<Expr>),

    /// Logical NOT.
    Not(Box<Expr>),

    /// IS NULL check.
    IsNull(Box<Expr>),
}

impl Expr {
    /// Creates an unqualified field reference.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Field(FieldRef::column(name))
    }

    /// Creates a qualified field reference.
    pub fn qualified(view: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Field(FieldRef::qualified(view, name))
    }

    /// Creates a literal.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a comparison.
    pub fn compare(left: Expr, op: ComparisonOp, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates an equality comparison.
    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::compare(left, ComparisonOp::Eq, right)
    }

    /// Combines two predicates with AND.
    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// Combines two predicates with OR.
    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// Negates a predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Creates an IS NULL check.
    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(field) => write!(f, "{}", field),
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::And(left, right) => write!(f, "({} AND {})", left, right),
            Expr::Or(left, right) => write!(f, "({} OR {})", left, right),
            Expr::Not(expr) => write!(f, "NOT {}", expr),
            Expr::IsNull(expr) => write!(f, "{} IS NULL", expr),
        }
    }
}
