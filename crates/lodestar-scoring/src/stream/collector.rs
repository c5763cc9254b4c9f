//! Group collectors and their incremental accumulators.

use std::collections::BTreeMap;
use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::Value;

use super::{MetricFn, UniKeyFn};

/// Aggregation applied to each group of a `group_by`.
#[derive(Clone)]
pub enum Collector<Sc: Score> {
    /// Number of members.
    Count,
    /// Sum of an integer metric.
    Sum(MetricFn<Sc>),
    /// Smallest value of an ordering key.
    Min(UniKeyFn<Sc>),
    /// Largest value of an ordering key.
    Max(UniKeyFn<Sc>),
    /// All member values, sorted (deterministic across runs).
    ToList(UniKeyFn<Sc>),
    /// Distinct member values.
    ToSet(UniKeyFn<Sc>),
    /// Cross-group unfairness of an integer load metric; the terminal weight
    /// function is applied once per solution, not per group.
    LoadBalance(MetricFn<Sc>),
}

impl<Sc: Score> std::fmt::Debug for Collector<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Collector::Count => "Count",
            Collector::Sum(_) => "Sum",
            Collector::Min(_) => "Min",
            Collector::Max(_) => "Max",
            Collector::ToList(_) => "ToList",
            Collector::ToSet(_) => "ToSet",
            Collector::LoadBalance(_) => "LoadBalance",
        };
        f.write_str(name)
    }
}

pub fn count<Sc: Score>() -> Collector<Sc> {
    Collector::Count
}

pub fn sum<Sc, F>(metric: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> i64 + Send + Sync + 'static,
{
    Collector::Sum(Arc::new(metric))
}

pub fn min<Sc, F>(key: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Collector::Min(Arc::new(key))
}

pub fn max<Sc, F>(key: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Collector::Max(Arc::new(key))
}

pub fn to_list<Sc, F>(value: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Collector::ToList(Arc::new(value))
}

pub fn to_set<Sc, F>(value: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Collector::ToSet(Arc::new(value))
}

pub fn load_balance<Sc, F>(metric: F) -> Collector<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> i64 + Send + Sync + 'static,
{
    Collector::LoadBalance(Arc::new(metric))
}

/// Aggregated value handed to a grouped terminal's weight function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    Count(i64),
    Sum(i64),
    /// `Value::None` when the group is empty.
    Min(Value),
    Max(Value),
    /// Sorted member values (with duplicates).
    List(Vec<Value>),
    /// Sorted distinct member values.
    Set(Vec<Value>),
}

impl Aggregate {
    pub fn as_count(&self) -> i64 {
        match self {
            Aggregate::Count(n) | Aggregate::Sum(n) => *n,
            Aggregate::List(v) => v.len() as i64,
            Aggregate::Set(v) => v.len() as i64,
            _ => 0,
        }
    }
}

/// Incremental per-group state behind an [`Aggregate`].
///
/// One uniform shape covers every collector: a member count, a running sum
/// and a sorted multiset, of which each collector uses what it needs.
#[derive(Debug, Default, Clone)]
pub struct GroupState {
    pub members: usize,
    pub sum: i64,
    pub values: BTreeMap<Value, usize>,
}

impl GroupState {
    pub fn is_empty(&self) -> bool {
        self.members == 0
    }

    pub fn add_value(&mut self, value: Value) {
        *self.values.entry(value).or_insert(0) += 1;
    }

    pub fn remove_value(&mut self, value: &Value) {
        if let Some(n) = self.values.get_mut(value) {
            *n -= 1;
            if *n == 0 {
                self.values.remove(value);
            }
        }
    }

    /// Snapshot as the collector's aggregate.
    pub fn aggregate<Sc: Score>(&self, collector: &Collector<Sc>) -> Aggregate {
        match collector {
            Collector::Count => Aggregate::Count(self.members as i64),
            Collector::Sum(_) => Aggregate::Sum(self.sum),
            Collector::Min(_) => Aggregate::Min(
                self.values
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or(Value::None),
            ),
            Collector::Max(_) => Aggregate::Max(
                self.values
                    .keys()
                    .next_back()
                    .cloned()
                    .unwrap_or(Value::None),
            ),
            Collector::ToList(_) => Aggregate::List(
                self.values
                    .iter()
                    .flat_map(|(v, n)| std::iter::repeat(v.clone()).take(*n))
                    .collect(),
            ),
            Collector::ToSet(_) => Aggregate::Set(self.values.keys().cloned().collect()),
            Collector::LoadBalance(_) => Aggregate::Sum(self.sum),
        }
    }
}
