//! Join engine.
//!
//! [`derive_join_condition`] turns a [`JoinSpec`] into a predicate and the
//! key columns of NATURAL and USING joins. [`JoinEngine`] runs cross, inner
//! and outer nested-loop joins in parallel over the left view's records.

mod condition;
mod engine;

pub use condition::{
    derive_join_condition, JoinCondition, JoinDirection, JoinQualifier, JoinSpec, JoinType,
};
pub use engine::{calc_minimum_required, JoinEngine};
