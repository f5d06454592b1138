//! Join specifications and condition derivation.

use std::fmt;

use strata_common::{StrataError, StrataResult};

use crate::data::{FieldRef, Header, View};
use crate::expr::Expr;

/// Join algorithm requested by the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// `CROSS JOIN`
    Cross,
    /// `INNER JOIN`
    Inner,
    /// `OUTER JOIN`
    Outer,
}

/// Preserved side of an outer join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinDirection {
    /// Preserve every row of the left view.
    #[default]
    Left,
    /// Preserve every row of the right view.
    Right,
    /// Preserve every row of both views.
    Full,
}

impl fmt::Display for JoinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinDirection::Left => "LEFT",
            JoinDirection::Right => "RIGHT",
            JoinDirection::Full => "FULL",
        };
        write!(f, "{}", s)
    }
}

/// Join qualifier as written in the query.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JoinQualifier {
    /// No qualifier and no condition.
    #[default]
    None,
    /// `NATURAL`
    Natural,
    /// `ON expr`
    On(Expr),
    /// `USING (col, ...)`
    Using(Vec<String>),
}

/// A join clause: type, direction and qualifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinSpec {
    /// Explicit join type. `None` means INNER, or OUTER when a direction is
    /// given.
    pub join_type: Option<JoinType>,
    /// Outer join direction.
    pub direction: Option<JoinDirection>,
    /// Condition qualifier.
    pub qualifier: JoinQualifier,
}

impl JoinSpec {
    /// `CROSS JOIN`
    pub fn cross() -> Self {
        Self {
            join_type: Some(JoinType::Cross),
            ..Self::default()
        }
    }

    /// `INNER JOIN`
    pub fn inner(qualifier: JoinQualifier) -> Self {
        Self {
            join_type: Some(JoinType::Inner),
            direction: None,
            qualifier,
        }
    }

    /// `<direction> OUTER JOIN`
    pub fn outer(direction: JoinDirection, qualifier: JoinQualifier) -> Self {
        Self {
            join_type: Some(JoinType::Outer),
            direction: Some(direction),
            qualifier,
        }
    }

    /// Returns the join type after applying defaults.
    pub fn resolved_type(&self) -> JoinType {
        match (self.join_type, self.direction) {
            (Some(join_type), _) => join_type,
            (None, Some(_)) => JoinType::Outer,
            (None, None) => JoinType::Inner,
        }
    }
}

/// A derived join condition.
///
/// For NATURAL and USING joins the key columns are listed twice: once as
/// the field kept in the merged header and once as the field dropped from
/// it. The index lists point into the merged header `left ++ right`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinCondition {
    /// Predicate to evaluate per candidate pair. `None` joins every pair.
    pub predicate: Option<Expr>,
    /// Key fields kept once in the merged header.
    pub include_fields: Vec<FieldRef>,
    /// Key fields dropped from the merged header.
    pub exclude_fields: Vec<FieldRef>,
    /// Merged-header positions of `include_fields`.
    pub include_indices: Vec<usize>,
    /// Merged-header positions of `exclude_fields`.
    pub exclude_indices: Vec<usize>,
}

impl JoinCondition {
    /// Returns true if key columns must be collapsed after the join.
    pub fn has_using_fields(&self) -> bool {
        !self.include_indices.is_empty()
    }
}

/// Derives the join predicate and key field lists for `spec`.
pub fn derive_join_condition(
    spec: &JoinSpec,
    view: &View,
    join_view: &View,
) -> StrataResult<JoinCondition> {
    let columns = match &spec.qualifier {
        JoinQualifier::None => return Ok(JoinCondition::default()),
        JoinQualifier::On(expr) => {
            return Ok(JoinCondition {
                predicate: Some(expr.clone()),
                ..JoinCondition::default()
            })
        }
        JoinQualifier::Natural => natural_columns(view.header(), join_view.header())?,
        JoinQualifier::Using(columns) => columns.clone(),
    };

    if columns.is_empty() {
        return Ok(JoinCondition::default());
    }

    let right_offset = view.field_len();
    let right_included = spec.direction == Some(JoinDirection::Right);
    let mut condition = JoinCondition::default();

    for column in &columns {
        let lidx = view.header().search_index(&FieldRef::column(column.as_str()))?;
        let ridx = join_view
            .header()
            .search_index(&FieldRef::column(column.as_str()))?;

        let lfield = qualify(view.header(), lidx, column);
        let rfield = qualify(join_view.header(), ridx, column);

        let comparison = Expr::equals(Expr::Field(lfield.clone()), Expr::Field(rfield.clone()));
        condition.predicate = Some(match condition.predicate.take() {
            Some(chain) => chain.and(comparison),
            None => comparison,
        });

        if right_included {
            condition.include_fields.push(rfield);
            condition.include_indices.push(right_offset + ridx);
            condition.exclude_fields.push(lfield);
            condition.exclude_indices.push(lidx);
        } else {
            condition.include_fields.push(lfield);
            condition.include_indices.push(lidx);
            condition.exclude_fields.push(rfield);
            condition.exclude_indices.push(right_offset + ridx);
        }
    }

    Ok(condition)
}

/// Columns shared by both headers, in left header order.
fn natural_columns(left: &Header, right: &Header) -> StrataResult<Vec<String>> {
    let mut columns = Vec::new();
    for field in left.fields() {
        if field.is_internal_id {
            continue;
        }
        match right.search_index(&FieldRef::column(field.column.as_str())) {
            Ok(_) => columns.push(field.column.clone()),
            Err(StrataError::FieldNotExist { .. }) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(columns)
}

fn qualify(header: &Header, index: usize, column: &str) -> FieldRef {
    match header.field(index) {
        Some(field) if !field.view.is_empty() => {
            FieldRef::qualified(field.view.as_str(), column)
        }
        _ => FieldRef::column(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn views() -> (View, View) {
        let left = View::from_values(
            "t1",
            &["id", "name", "age"],
            vec![vec![Value::int(1), Value::string("a"), Value::int(20)]],
        )
        .unwrap();
        let right = View::from_values(
            "t2",
            &["ID", "score", "age"],
            vec![vec![Value::int(1), Value::int(90), Value::int(20)]],
        )
        .unwrap();
        (left, right)
    }

    #[test]
    fn test_no_qualifier_is_cross() {
        let (left, right) = views();
        let condition = derive_join_condition(&JoinSpec::default(), &left, &right).unwrap();
        assert!(condition.predicate.is_none());
        assert!(!condition.has_using_fields());
    }

    #[test]
    fn test_on_is_verbatim() {
        let (left, right) = views();
        let expr = Expr::equals(Expr::qualified("t1", "id"), Expr::qualified("t2", "id"));
        let spec = JoinSpec::inner(JoinQualifier::On(expr.clone()));

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        assert_eq!(condition.predicate, Some(expr));
        assert!(condition.include_fields.is_empty());
        assert!(condition.exclude_fields.is_empty());
    }

    #[test]
    fn test_using_single_column() {
        let (left, right) = views();
        let spec = JoinSpec::inner(JoinQualifier::Using(vec!["id".to_string()]));

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        assert_eq!(
            condition.predicate.as_ref().map(ToString::to_string),
            Some("t1.id = t2.id".to_string())
        );
        assert_eq!(condition.include_fields, vec![FieldRef::qualified("t1", "id")]);
        assert_eq!(condition.exclude_fields, vec![FieldRef::qualified("t2", "id")]);
        assert_eq!(condition.include_indices, vec![0]);
        assert_eq!(condition.exclude_indices, vec![3]);
    }

    #[test]
    fn test_using_right_includes_right_side() {
        let (left, right) = views();
        let spec = JoinSpec::outer(
            JoinDirection::Right,
            JoinQualifier::Using(vec!["age".to_string()]),
        );

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        assert_eq!(condition.include_fields, vec![FieldRef::qualified("t2", "age")]);
        assert_eq!(condition.include_indices, vec![5]);
        assert_eq!(condition.exclude_indices, vec![2]);
    }

    #[test]
    fn test_using_multiple_columns_is_left_deep() {
        let (left, right) = views();
        let spec = JoinSpec::inner(JoinQualifier::Using(vec![
            "id".to_string(),
            "age".to_string(),
        ]));

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        match condition.predicate {
            Some(Expr::And(lhs, rhs)) => {
                assert_eq!(lhs.to_string(), "t1.id = t2.id");
                assert_eq!(rhs.to_string(), "t1.age = t2.age");
            }
            other => panic!("unexpected predicate: {:?}", other),
        }
    }

    #[test]
    fn test_using_unknown_column() {
        let (left, right) = views();
        let spec = JoinSpec::inner(JoinQualifier::Using(vec!["name".to_string()]));

        let err = derive_join_condition(&spec, &left, &right).unwrap_err();
        assert!(matches!(err, StrataError::FieldNotExist { .. }));
    }

    #[test]
    fn test_natural_shared_columns() {
        let (left, right) = views();
        let spec = JoinSpec::inner(JoinQualifier::Natural);

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        assert_eq!(
            condition.include_fields,
            vec![FieldRef::qualified("t1", "id"), FieldRef::qualified("t1", "age")]
        );
        assert_eq!(condition.exclude_indices, vec![3, 5]);
    }

    #[test]
    fn test_natural_without_shared_columns() {
        let left = View::from_values("a", &["x"], vec![]).unwrap();
        let right = View::from_values("b", &["y"], vec![]).unwrap();
        let spec = JoinSpec::inner(JoinQualifier::Natural);

        let condition = derive_join_condition(&spec, &left, &right).unwrap();
        assert!(condition.predicate.is_none());
        assert!(!condition.has_using_fields());
    }

    #[test]
    fn test_natural_ambiguous() {
        let left = View::from_values("a", &["x"], vec![]).unwrap();
        let right = View::from_values("b", &["x", "X"], vec![]).unwrap();
        let spec = JoinSpec::inner(JoinQualifier::Natural);

        let err = derive_join_condition(&spec, &left, &right).unwrap_err();
        assert!(matches!(err, StrataError::FieldAmbiguous { .. }));
    }

    #[test]
    fn test_resolved_type() {
        assert_eq!(JoinSpec::default().resolved_type(), JoinType::Inner);
        assert_eq!(JoinSpec::cross().resolved_type(), JoinType::Cross);
        let spec = JoinSpec {
            direction: Some(JoinDirection::Full),
            ..JoinSpec::default()
        };
        assert_eq!(spec.resolved_type(), JoinType::Outer);
    }
}
