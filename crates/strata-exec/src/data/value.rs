//! Runtime values for query execution.
//!
//! This module defines the `Value` type stored in every record cell and the
//! three-valued `Ternary` logic used by predicates.

use std::cmp::Ordering;
use std::fmt;

use strata_common::{StrataError, StrataResult};

/// A runtime value stored in one record cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates an integer value.
    pub fn int(v: i64) -> Self {
        Value::Integer(v)
    }

    /// Creates a float value.
    pub fn float(v: f64) -> Self {
        Value::Float(v)
    }

    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the name of this value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    /// Converts this value to an f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Compares two values with SQL semantics.
    ///
    /// Returns `Ok(None)` when either side is NULL. Integers and floats
    /// compare numerically; other mixed types are a type mismatch.
    pub fn sql_cmp(&self, other: &Value) -> StrataResult<Option<Ordering>> {
        let ordering = match (self, other) {
            (Value::Null, _) | (_, Value::Null) => return Ok(None),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                let (a, b) = (self.to_f64(), other.to_f64());
                match (a, b) {
                    (Some(a), Some(b)) => return Ok(a.partial_cmp(&b)),
                    _ => return Ok(None),
                }
            }
            _ => {
                return Err(StrataError::TypeMismatch {
                    left: self.type_name().to_string(),
                    right: other.type_name().to_string(),
                })
            }
        };
        Ok(Some(ordering))
    }

    /// Converts this value to a three-valued logical value.
    pub fn to_ternary(&self) -> Ternary {
        match self {
            Value::Null => Ternary::Unknown,
            Value::Boolean(b) => Ternary::from_bool(*b),
            Value::Integer(i) => Ternary::from_bool(*i != 0),
            Value::Float(f) => Ternary::from_bool(*f != 0.0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ternary::True,
                "false" => Ternary::False,
                _ => Ternary::Unknown,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// A logical value in {TRUE, FALSE, UNKNOWN}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ternary {
    /// TRUE.
    True,
    /// FALSE.
    False,
    /// UNKNOWN.
    Unknown,
}

impl Ternary {
    /// Converts a boolean.
    pub const fn from_bool(b: bool) -> Self {
        if b {
            Ternary::True
        } else {
            Ternary::False
        }
    }

    /// Converts an optional boolean; `None` is UNKNOWN.
    pub const fn from_option(b: Option<bool>) -> Self {
        match b {
            Some(b) => Self::from_bool(b),
            None => Ternary::Unknown,
        }
    }

    /// Returns true only for TRUE.
    pub const fn is_true(self) -> bool {
        matches!(self, Ternary::True)
    }

    /// Three-valued AND.
    pub const fn and(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::False, _) | (_, Ternary::False) => Ternary::False,
            (Ternary::True, Ternary::True) => Ternary::True,
            _ => Ternary::Unknown,
        }
    }

    /// Three-valued OR.
    pub const fn or(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::True, _) | (_, Ternary::True) => Ternary::True,
            (Ternary::False, Ternary::False) => Ternary::False,
            _ => Ternary::Unknown,
        }
    }

    /// Three-valued NOT.
    #[allow(clippy::should_implement_trait)]
    pub const fn not(self) -> Ternary {
        match self {
            Ternary::True => Ternary::False,
            Ternary::False => Ternary::True,
            Ternary::Unknown => Ternary::Unknown,
        }
    }
}

impl fmt::Display for Ternary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ternary::True => write!(f, "TRUE"),
            Ternary::False => write!(f, "FALSE"),
            Ternary::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_cmp() {
        assert_eq!(Value::int(1).sql_cmp(&Value::int(2)).unwrap(), Some(Ordering::Less));
        assert_eq!(
            Value::int(2).sql_cmp(&Value::float(2.0)).unwrap(),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::Null.sql_cmp(&Value::int(1)).unwrap(), None);
        assert_eq!(
            Value::string("b").sql_cmp(&Value::string("a")).unwrap(),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_sql_cmp_type_mismatch() {
        let err = Value::int(1).sql_cmp(&Value::string("1")).unwrap_err();
        assert!(matches!(err, StrataError::TypeMismatch { .. }));
    }

    #[test]
    fn test_ternary_logic() {
        assert_eq!(Ternary::True.and(Ternary::Unknown), Ternary::Unknown);
        assert_eq!(Ternary::False.and(Ternary::Unknown), Ternary::False);
        assert_eq!(Ternary::True.or(Ternary::Unknown), Ternary::True);
        assert_eq!(Ternary::False.or(Ternary::Unknown), Ternary::Unknown);
        assert_eq!(Ternary::Unknown.not(), Ternary::Unknown);
        assert_eq!(Ternary::from_option(None), Ternary::Unknown);
    }

    #[test]
    fn test_to_ternary() {
        assert_eq!(Value::Null.to_ternary(), Ternary::Unknown);
        assert_eq!(Value::boolean(true).to_ternary(), Ternary::True);
        assert_eq!(Value::int(0).to_ternary(), Ternary::False);
        assert_eq!(Value::string("TRUE").to_ternary(), Ternary::True);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::int(42).to_string(), "42");
        assert_eq!(Ternary::Unknown.to_string(), "UNKNOWN");
    }
}
