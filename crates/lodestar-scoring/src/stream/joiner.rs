//! Joiners: how two stream sides are matched into pairs.
//!
//! Equality joiners compile to hash indexes, comparison joiners to ordered
//! indexes, `overlapping` to an interval index. `filtering` is a plain
//! predicate and always runs last, against candidates the indexes produced.

use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::Value;

use super::{PairPredicate, UniKeyFn};

/// Comparison operator for ordered joiners, applied as `left OP right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl CompareOp {
    /// The operator seen from the right side: `a OP b` iff `b OP.flip() a`.
    pub fn flip(self) -> Self {
        match self {
            CompareOp::LessThan => CompareOp::GreaterThan,
            CompareOp::LessThanOrEqual => CompareOp::GreaterThanOrEqual,
            CompareOp::GreaterThan => CompareOp::LessThan,
            CompareOp::GreaterThanOrEqual => CompareOp::LessThanOrEqual,
        }
    }

    pub fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::LessThan => left < right,
            CompareOp::LessThanOrEqual => left <= right,
            CompareOp::GreaterThan => left > right,
            CompareOp::GreaterThanOrEqual => left >= right,
        }
    }
}

/// A pairing condition between a left and a right stream element.
#[derive(Clone)]
pub enum Joiner<Sc: Score> {
    /// `left_key == right_key`, hash-indexed.
    Equal {
        left: UniKeyFn<Sc>,
        right: UniKeyFn<Sc>,
    },
    /// `left_key OP right_key`, range-indexed.
    Compare {
        op: CompareOp,
        left: UniKeyFn<Sc>,
        right: UniKeyFn<Sc>,
    },
    /// Half-open intervals `[start, end)` overlap: `s1 < e2 && s2 < e1`.
    Overlapping {
        left_start: UniKeyFn<Sc>,
        left_end: UniKeyFn<Sc>,
        right_start: UniKeyFn<Sc>,
        right_end: UniKeyFn<Sc>,
    },
    /// Arbitrary predicate, never indexed.
    Filtering(PairPredicate<Sc>),
}

impl<Sc: Score> Joiner<Sc> {
    /// True if this joiner can back an index (everything but `Filtering`).
    pub fn is_indexable(&self) -> bool {
        !matches!(self, Joiner::Filtering(_))
    }

    /// Evaluates the joiner directly on a candidate pair.
    pub fn holds(&self, solution: &Solution<Sc>, left: usize, right: usize) -> bool {
        match self {
            Joiner::Equal { left: lk, right: rk } => {
                (lk)(solution, left) == (rk)(solution, right)
            }
            Joiner::Compare { op, left: lk, right: rk } => {
                op.holds(&(lk)(solution, left), &(rk)(solution, right))
            }
            Joiner::Overlapping {
                left_start,
                left_end,
                right_start,
                right_end,
            } => {
                let s1 = (left_start)(solution, left);
                let e1 = (left_end)(solution, left);
                let s2 = (right_start)(solution, right);
                let e2 = (right_end)(solution, right);
                s1 < e2 && s2 < e1
            }
            Joiner::Filtering(pred) => (pred)(solution, left, right),
        }
    }
}

impl<Sc: Score> std::fmt::Debug for Joiner<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Joiner::Equal { .. } => "Equal",
            Joiner::Compare { op, .. } => return write!(f, "Compare({op:?})"),
            Joiner::Overlapping { .. } => "Overlapping",
            Joiner::Filtering(_) => "Filtering",
        };
        f.write_str(name)
    }
}

/// Equality joiner with the same key mapping on both sides.
pub fn equal<Sc, F>(key: F) -> Joiner<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    let key: UniKeyFn<Sc> = Arc::new(key);
    Joiner::Equal {
        left: Arc::clone(&key),
        right: key,
    }
}

/// Equality joiner with distinct left/right key mappings.
pub fn equal_by<Sc, L, R>(left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Joiner::Equal {
        left: Arc::new(left),
        right: Arc::new(right),
    }
}

fn compare<Sc, L, R>(op: CompareOp, left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    Joiner::Compare {
        op,
        left: Arc::new(left),
        right: Arc::new(right),
    }
}

pub fn less_than<Sc, L, R>(left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    compare(CompareOp::LessThan, left, right)
}

pub fn less_than_or_equal<Sc, L, R>(left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    compare(CompareOp::LessThanOrEqual, left, right)
}

pub fn greater_than<Sc, L, R>(left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    compare(CompareOp::GreaterThan, left, right)
}

pub fn greater_than_or_equal<Sc, L, R>(left: L, right: R) -> Joiner<Sc>
where
    Sc: Score,
    L: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    R: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    compare(CompareOp::GreaterThanOrEqual, left, right)
}

/// Interval-overlap joiner with the same start/end mappings on both sides.
pub fn overlapping<Sc, S, E>(start: S, end: E) -> Joiner<Sc>
where
    Sc: Score,
    S: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    E: Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
{
    let start: UniKeyFn<Sc> = Arc::new(start);
    let end: UniKeyFn<Sc> = Arc::new(end);
    Joiner::Overlapping {
        left_start: Arc::clone(&start),
        left_end: Arc::clone(&end),
        right_start: start,
        right_end: end,
    }
}

/// Interval-overlap joiner with distinct mappings per side.
pub fn overlapping_by<Sc>(
    left_start: UniKeyFn<Sc>,
    left_end: UniKeyFn<Sc>,
    right_start: UniKeyFn<Sc>,
    right_end: UniKeyFn<Sc>,
) -> Joiner<Sc>
where
    Sc: Score,
{
    Joiner::Overlapping {
        left_start,
        left_end,
        right_start,
        right_end,
    }
}

/// Predicate joiner; runs after all index joiners.
pub fn filtering<Sc, F>(predicate: F) -> Joiner<Sc>
where
    Sc: Score,
    F: Fn(&Solution<Sc>, usize, usize) -> bool + Send + Sync + 'static,
{
    Joiner::Filtering(Arc::new(predicate))
}
