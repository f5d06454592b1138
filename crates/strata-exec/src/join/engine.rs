//! Nested-loop join algorithms.
//!
//! Every join reads the left view's records, partitions them across the
//! workers granted by the [`CapacityGovernor`], and replaces the left view's
//! header and records with the joined result. Within a partition rows come
//! out left-major, right-minor; partitions are concatenated in index order,
//! so the output order does not depend on the worker count.

use std::fmt;
use std::sync::Arc;

use strata_common::{ExecutionConfig, StrataError, StrataResult};

use super::condition::{derive_join_condition, JoinCondition, JoinDirection, JoinSpec, JoinType};
use crate::context::ExecContext;
use crate::data::{Header, Record, View};
use crate::expr::{DefaultEvaluator, Evaluator, Expr, RowScope};
use crate::parallel::{CapacityGovernor, RecordPool, TaskScheduler};

/// Computes the per-worker record threshold for a join of `left_len` rows
/// against `right_len` rows.
///
/// The work of one left row grows with the right side, so the threshold
/// shrinks as the product grows. Returns `default` when either side is
/// empty or the product does not exceed `default`.
pub fn calc_minimum_required(left_len: usize, right_len: usize, default: usize) -> usize {
    if left_len == 0 || right_len == 0 || default == 0 {
        return default;
    }
    let product = left_len.saturating_mul(right_len);
    if product <= default {
        return default;
    }
    left_len.div_ceil(product / default)
}

/// Executes joins between materialized views.
pub struct JoinEngine {
    governor: Arc<CapacityGovernor>,
    evaluator: Arc<dyn Evaluator>,
    config: ExecutionConfig,
}

impl JoinEngine {
    /// Creates an engine with its own governor and the default evaluator.
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            governor: Arc::new(CapacityGovernor::from_config(&config)),
            evaluator: Arc::new(DefaultEvaluator::new()),
            config,
        }
    }

    /// Replaces the governor, typically with one shared by the process.
    pub fn with_governor(mut self, governor: Arc<CapacityGovernor>) -> Self {
        self.governor = governor;
        self
    }

    /// Replaces the expression evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Returns the governor.
    pub fn governor(&self) -> &Arc<CapacityGovernor> {
        &self.governor
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Joins `join_view` into `view` as described by `spec`.
    ///
    /// After a NATURAL or USING join the key columns are collapsed: each key
    /// appears once, unqualified, ahead of the remaining columns. A NULL key
    /// on the kept side is replaced by the dropped side's value.
    pub fn join_views(
        &self,
        ctx: &ExecContext,
        view: &mut View,
        join_view: &View,
        spec: &JoinSpec,
    ) -> StrataResult<()> {
        let condition = derive_join_condition(spec, view, join_view)?;

        match spec.resolved_type() {
            JoinType::Cross => self.cross_join(ctx, view, join_view)?,
            JoinType::Inner => self.inner_join(ctx, view, join_view, condition.predicate.as_ref())?,
            JoinType::Outer => self.outer_join(
                ctx,
                view,
                join_view,
                condition.predicate.as_ref(),
                spec.direction,
            )?,
        }

        if condition.has_using_fields() {
            self.collapse_join_columns(ctx, view, &condition)?;
        }
        Ok(())
    }

    /// Replaces `view` with its Cartesian product with `join_view`.
    ///
    /// Row `i * R + j` of the result is `view[i] ++ join_view[j]`.
    pub fn cross_join(&self, ctx: &ExecContext, view: &mut View, join_view: &View) -> StrataResult<()> {
        let header = view.header().merge(join_view.header());
        let records = {
            let left = view.records();
            let right = join_view.records();
            let scheduler = self.scheduler(left.len(), Some(self.minimum_required(left, right)));

            let outputs = scheduler.run_partitions(ctx, |partition| {
                let mut out = Vec::with_capacity(partition.len() * right.len());
                for i in partition.range() {
                    if partition.should_stop(i) {
                        break;
                    }
                    for record in right {
                        out.push(left[i].concat(record));
                    }
                }
                Ok(out)
            })?;
            outputs.into_iter().flatten().collect::<Vec<_>>()
        };

        tracing::debug!(
            left = view.record_len(),
            right = join_view.record_len(),
            rows = records.len(),
            "cross join finished"
        );
        view.replace(header, records);
        Ok(())
    }

    /// Replaces `view` with the pairs of `view ++ join_view` for which
    /// `predicate` is TRUE. Without a predicate this is a cross join.
    pub fn inner_join(
        &self,
        ctx: &ExecContext,
        view: &mut View,
        join_view: &View,
        predicate: Option<&Expr>,
    ) -> StrataResult<()> {
        let Some(predicate) = predicate else {
            return self.cross_join(ctx, view, join_view);
        };

        let header = view.header().merge(join_view.header());
        let records = {
            let left = view.records();
            let right = join_view.records();
            let width = header.len();
            let pool = RecordPool::from_config(&self.config);
            let scheduler = self.scheduler(left.len(), Some(self.minimum_required(left, right)));

            let outputs = scheduler.run_partitions(ctx, |partition| {
                let mut scope = RowScope::new(&header);
                let mut out = Vec::new();
                for i in partition.range() {
                    if partition.should_stop(i) {
                        break;
                    }
                    for record in right {
                        let mut candidate = pool.acquire(width);
                        candidate.fill_merged(left[i].cells(), record.cells());
                        let (matched, candidate) =
                            self.test_candidate(ctx, &mut scope, predicate, candidate)?;
                        if matched {
                            out.push(candidate);
                        } else {
                            pool.release(candidate);
                        }
                    }
                }
                Ok(out)
            })?;
            outputs.into_iter().flatten().collect::<Vec<_>>()
        };

        tracing::debug!(
            left = view.record_len(),
            right = join_view.record_len(),
            rows = records.len(),
            "inner join finished"
        );
        view.replace(header, records);
        Ok(())
    }

    /// Replaces `view` with the outer join of `view` and `join_view`.
    ///
    /// `direction` defaults to LEFT. Unmatched rows of a preserved side are
    /// padded with NULLs. For FULL joins, right rows that matched nothing
    /// are appended after every left row, in right-row order.
    pub fn outer_join(
        &self,
        ctx: &ExecContext,
        view: &mut View,
        join_view: &View,
        predicate: Option<&Expr>,
        direction: Option<JoinDirection>,
    ) -> StrataResult<()> {
        let direction = direction.unwrap_or_default();
        let header = view.header().merge(join_view.header());

        let records = {
            // A RIGHT join is a LEFT join with the sides swapped. Merged
            // records are always laid out as `view ++ join_view`.
            let swapped = direction == JoinDirection::Right;
            let full = direction == JoinDirection::Full;
            let (preserved, other) = if swapped {
                (join_view, &*view)
            } else {
                (&*view, join_view)
            };

            let left = preserved.records();
            let right = other.records();
            let width = header.len();
            let padding = Record::nulls(other.field_len());
            let pool = RecordPool::from_config(&self.config);
            let scheduler = self.scheduler(left.len(), Some(self.minimum_required(left, right)));

            let outputs = scheduler.run_partitions(ctx, |partition| {
                let mut scope = RowScope::new(&header);
                let mut out = Vec::new();
                let mut right_matched = if full {
                    vec![false; right.len()]
                } else {
                    Vec::new()
                };

                for i in partition.range() {
                    if partition.should_stop(i) {
                        break;
                    }
                    let mut matched = false;
                    for (j, record) in right.iter().enumerate() {
                        let mut candidate = pool.acquire(width);
                        fill_oriented(&mut candidate, &left[i], record, swapped);
                        let (is_match, candidate) = match predicate {
                            Some(predicate) => {
                                self.test_candidate(ctx, &mut scope, predicate, candidate)?
                            }
                            None => (true, candidate),
                        };
                        if is_match {
                            out.push(candidate);
                            matched = true;
                            if full {
                                right_matched[j] = true;
                            }
                        } else {
                            pool.release(candidate);
                        }
                    }
                    if !matched {
                        let mut padded = Record::nulls(width);
                        fill_oriented(&mut padded, &left[i], &padding, swapped);
                        out.push(padded);
                    }
                }
                Ok((out, right_matched))
            })?;

            let mut records = Vec::new();
            let mut right_matched = vec![false; if full { right.len() } else { 0 }];
            for (out, flags) in outputs {
                records.extend(out);
                for (seen, flag) in right_matched.iter_mut().zip(flags) {
                    *seen |= flag;
                }
            }

            if full {
                let left_padding = Record::nulls(preserved.field_len());
                for (record, _) in right.iter().zip(&right_matched).filter(|(_, seen)| !**seen) {
                    records.push(left_padding.concat(record));
                }
            }
            records
        };

        tracing::debug!(
            left = view.record_len(),
            right = join_view.record_len(),
            rows = records.len(),
            %direction,
            "outer join finished"
        );
        view.replace(header, records);
        Ok(())
    }

    fn collapse_join_columns(
        &self,
        ctx: &ExecContext,
        view: &mut View,
        condition: &JoinCondition,
    ) -> StrataResult<()> {
        let fields = view.header().fields();
        let mut collapsed = Vec::with_capacity(fields.len() - condition.exclude_indices.len());
        // (source index, fallback index for a NULL key)
        let mut sources: Vec<(usize, Option<usize>)> = Vec::with_capacity(collapsed.capacity());

        for (&include, &exclude) in condition
            .include_indices
            .iter()
            .zip(&condition.exclude_indices)
        {
            let field = fields.get(include).cloned().ok_or_else(|| {
                StrataError::internal(format!("join column {} out of range", include))
            })?;
            collapsed.push(field.into_join_column());
            sources.push((include, Some(exclude)));
        }
        for (i, field) in fields.iter().enumerate() {
            if condition.include_indices.contains(&i) || condition.exclude_indices.contains(&i) {
                continue;
            }
            collapsed.push(field.clone());
            sources.push((i, None));
        }

        let header = Header::from_fields(collapsed);
        let records = {
            let source = view.records();
            let outputs = self
                .scheduler(source.len(), None)
                .run_partitions(ctx, |partition| {
                    let mut out = Vec::with_capacity(partition.len());
                    for i in partition.range() {
                        if partition.should_stop(i) {
                            break;
                        }
                        let record = &source[i];
                        let cells = sources
                            .iter()
                            .map(|&(index, fallback)| match fallback {
                                Some(fallback) if record[index].is_null() => record[fallback].clone(),
                                _ => record[index].clone(),
                            })
                            .collect();
                        out.push(Record::new(cells));
                    }
                    Ok(out)
                })?;
            outputs.into_iter().flatten().collect::<Vec<_>>()
        };

        view.replace(header, records);
        Ok(())
    }

    /// Evaluates `predicate` against `candidate` and hands the record back.
    fn test_candidate(
        &self,
        ctx: &ExecContext,
        scope: &mut RowScope<'_>,
        predicate: &Expr,
        candidate: Record,
    ) -> StrataResult<(bool, Record)> {
        scope.set_record(candidate);
        let verdict = self.evaluator.evaluate_predicate(ctx, scope, predicate)?;
        let candidate = scope
            .take_record()
            .ok_or_else(|| StrataError::internal("scope lost its current record"))?;
        Ok((verdict.is_true(), candidate))
    }

    fn minimum_required(&self, left: &[Record], right: &[Record]) -> usize {
        calc_minimum_required(left.len(), right.len(), self.governor.min_records_per_core())
    }

    fn scheduler(&self, record_count: usize, min_per_core: Option<usize>) -> TaskScheduler<'_> {
        TaskScheduler::new(&self.governor, record_count, min_per_core, self.config.cpu)
            .with_poll_interval(self.config.cancellation_poll_interval)
    }
}

impl fmt::Debug for JoinEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinEngine")
            .field("governor", &self.governor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Writes `preserved ++ other` into `target`, or `other ++ preserved` when the
/// sides were swapped for a RIGHT join.
fn fill_oriented(target: &mut Record, preserved: &Record, other: &Record, swapped: bool) {
    if swapped {
        target.fill_merged(other.cells(), preserved.cells());
    } else {
        target.fill_merged(preserved.cells(), other.cells());
    }
}
