//! Join indexes: hash buckets for equality keys, ordered maps for
//! comparison joiners, an interval map for overlap joiners.
//!
//! A [`JoinIndex`] holds one side of a join. The strategy is chosen from
//! the joiner list: all equality joiners fold into one composite hash key;
//! otherwise the first comparison or overlap joiner backs a range index.
//! Remaining joiners stay residual and are checked per candidate.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::Value;

use crate::stream::joiner::{CompareOp, Joiner};
use crate::stream::UniKeyFn;

/// Which side of the join an index stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

enum Storage {
    /// Composite equality key to member set.
    Hash(HashMap<Vec<Value>, BTreeSet<usize>>),
    /// Single comparison key to member set, range-queryable.
    Ordered(BTreeMap<Value, BTreeSet<usize>>),
    /// Interval start (disambiguated by member) to interval end.
    Interval(BTreeMap<(Value, usize), Value>),
    /// No indexable joiner: plain member set, full scan per probe.
    Scan(BTreeSet<usize>),
}

enum Strategy<Sc: Score> {
    Hash { keys: Vec<UniKeyFn<Sc>> },
    Ordered { op: CompareOp, key: UniKeyFn<Sc> },
    Interval { start: UniKeyFn<Sc>, end: UniKeyFn<Sc> },
    Scan,
}

/// One side of a join, probe-able from the other side.
pub struct JoinIndex<Sc: Score> {
    side: Side,
    storage: Storage,
    strategy: Strategy<Sc>,
    /// Key mappings of the probing (other) side, mirroring `strategy`.
    probe_keys: Vec<UniKeyFn<Sc>>,
}

impl<Sc: Score> JoinIndex<Sc> {
    /// Builds the index for `side`, choosing the strategy from `joiners`.
    pub fn new(joiners: &[Joiner<Sc>], side: Side) -> Self {
        let equals: Vec<_> = joiners
            .iter()
            .filter_map(|j| match j {
                Joiner::Equal { left, right } => Some((left.clone(), right.clone())),
                _ => None,
            })
            .collect();
        if !equals.is_empty() {
            let (keys, probe_keys) = match side {
                Side::Left => (
                    equals.iter().map(|(l, _)| l.clone()).collect::<Vec<_>>(),
                    equals.iter().map(|(_, r)| r.clone()).collect(),
                ),
                Side::Right => (
                    equals.iter().map(|(_, r)| r.clone()).collect::<Vec<_>>(),
                    equals.iter().map(|(l, _)| l.clone()).collect(),
                ),
            };
            return Self {
                side,
                storage: Storage::Hash(HashMap::new()),
                strategy: Strategy::Hash { keys },
                probe_keys,
            };
        }
        for joiner in joiners {
            match joiner {
                Joiner::Compare { op, left, right } => {
                    // Stored key is this side's; probes arrive from the other
                    // side, so the operator is flipped there.
                    let (key, probe, op) = match side {
                        Side::Left => (left.clone(), right.clone(), *op),
                        Side::Right => (right.clone(), left.clone(), op.flip()),
                    };
                    return Self {
                        side,
                        storage: Storage::Ordered(BTreeMap::new()),
                        strategy: Strategy::Ordered { op, key },
                        probe_keys: vec![probe],
                    };
                }
                Joiner::Overlapping {
                    left_start,
                    left_end,
                    right_start,
                    right_end,
                } => {
                    let (start, end, probe_start, probe_end) = match side {
                        Side::Left => (
                            left_start.clone(),
                            left_end.clone(),
                            right_start.clone(),
                            right_end.clone(),
                        ),
                        Side::Right => (
                            right_start.clone(),
                            right_end.clone(),
                            left_start.clone(),
                            left_end.clone(),
                        ),
                    };
                    return Self {
                        side,
                        storage: Storage::Interval(BTreeMap::new()),
                        strategy: Strategy::Interval { start, end },
                        probe_keys: vec![probe_start, probe_end],
                    };
                }
                _ => {}
            }
        }
        Self {
            side,
            storage: Storage::Scan(BTreeSet::new()),
            strategy: Strategy::Scan,
            probe_keys: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Hash(m) => m.clear(),
            Storage::Ordered(m) => m.clear(),
            Storage::Interval(m) => m.clear(),
            Storage::Scan(s) => s.clear(),
        }
    }

    pub fn insert(&mut self, solution: &Solution<Sc>, entity: usize) {
        match (&mut self.storage, &self.strategy) {
            (Storage::Hash(map), Strategy::Hash { keys }) => {
                let key = keys.iter().map(|k| k(solution, entity)).collect();
                map.entry(key).or_default().insert(entity);
            }
            (Storage::Ordered(map), Strategy::Ordered { key, .. }) => {
                map.entry(key(solution, entity)).or_default().insert(entity);
            }
            (Storage::Interval(map), Strategy::Interval { start, end }) => {
                map.insert((start(solution, entity), entity), end(solution, entity));
            }
            (Storage::Scan(set), Strategy::Scan) => {
                set.insert(entity);
            }
            _ => unreachable!("storage always matches strategy"),
        }
    }

    /// Removes an entity; must be called before its key fields change.
    pub fn remove(&mut self, solution: &Solution<Sc>, entity: usize) {
        match (&mut self.storage, &self.strategy) {
            (Storage::Hash(map), Strategy::Hash { keys }) => {
                let key: Vec<Value> = keys.iter().map(|k| k(solution, entity)).collect();
                if let Some(bucket) = map.get_mut(&key) {
                    bucket.remove(&entity);
                    if bucket.is_empty() {
                        map.remove(&key);
                    }
                }
            }
            (Storage::Ordered(map), Strategy::Ordered { key, .. }) => {
                let key = key(solution, entity);
                if let Some(bucket) = map.get_mut(&key) {
                    bucket.remove(&entity);
                    if bucket.is_empty() {
                        map.remove(&key);
                    }
                }
            }
            (Storage::Interval(map), Strategy::Interval { start, .. }) => {
                map.remove(&(start(solution, entity), entity));
            }
            (Storage::Scan(set), Strategy::Scan) => {
                set.remove(&entity);
            }
            _ => unreachable!("storage always matches strategy"),
        }
    }

    /// Members matching a probe entity from the other side, in index order.
    ///
    /// Only the indexed joiner is applied; residual joiners are the
    /// caller's concern.
    pub fn candidates(&self, solution: &Solution<Sc>, probe: usize) -> Vec<usize> {
        match (&self.storage, &self.strategy) {
            (Storage::Hash(map), Strategy::Hash { .. }) => {
                let key: Vec<Value> = self.probe_keys.iter().map(|k| k(solution, probe)).collect();
                map.get(&key)
                    .map(|b| b.iter().copied().collect())
                    .unwrap_or_default()
            }
            (Storage::Ordered(map), Strategy::Ordered { op, .. }) => {
                use std::ops::Bound::{Excluded, Included, Unbounded};
                let probe_key = (self.probe_keys[0])(solution, probe);
                // Uniform semantics after the build-time flip: select
                // stored members m with `key(m) OP probe_key`.
                let range: (std::ops::Bound<&Value>, std::ops::Bound<&Value>) = match op.flip() {
                    CompareOp::LessThan => (Excluded(&probe_key), Unbounded),
                    CompareOp::LessThanOrEqual => (Included(&probe_key), Unbounded),
                    CompareOp::GreaterThan => (Unbounded, Excluded(&probe_key)),
                    CompareOp::GreaterThanOrEqual => (Unbounded, Included(&probe_key)),
                };
                map.range(range)
                    .flat_map(|(_, b)| b.iter().copied())
                    .collect()
            }
            (Storage::Interval(map), Strategy::Interval { .. }) => {
                let probe_start = (self.probe_keys[0])(solution, probe);
                let probe_end = (self.probe_keys[1])(solution, probe);
                // Overlap: stored.start < probe.end && probe.start < stored.end
                map.range(..(probe_end, 0usize))
                    .filter(|(_, end)| probe_start < **end)
                    .map(|((_, member), _)| *member)
                    .collect()
            }
            (Storage::Scan(set), Strategy::Scan) => set.iter().copied().collect(),
            _ => unreachable!("storage always matches strategy"),
        }
    }

    /// All currently indexed members, in index order.
    pub fn members(&self) -> Vec<usize> {
        let mut out: Vec<usize> = match &self.storage {
            Storage::Hash(map) => map.values().flat_map(|b| b.iter().copied()).collect(),
            Storage::Ordered(map) => map.values().flat_map(|b| b.iter().copied()).collect(),
            Storage::Interval(map) => map.keys().map(|(_, m)| *m).collect(),
            Storage::Scan(set) => set.iter().copied().collect(),
        };
        out.sort_unstable();
        out
    }
}

impl<Sc: Score> std::fmt::Debug for JoinIndex<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategy = match &self.strategy {
            Strategy::Hash { keys } => format!("Hash({} keys)", keys.len()),
            Strategy::Ordered { op, .. } => format!("Ordered({op:?})"),
            Strategy::Interval { .. } => "Interval".to_string(),
            Strategy::Scan => "Scan".to_string(),
        };
        f.debug_struct("JoinIndex")
            .field("side", &self.side)
            .field("strategy", &strategy)
            .finish()
    }
}

/// Splits joiners into those covered by the chosen index and the residual
/// tail every candidate still has to pass.
pub fn residual_joiners<Sc: Score>(joiners: &[Joiner<Sc>]) -> Vec<Joiner<Sc>> {
    let has_equal = joiners.iter().any(|j| matches!(j, Joiner::Equal { .. }));
    let mut indexed_range = false;
    joiners
        .iter()
        .filter(|j| match j {
            Joiner::Equal { .. } => false,
            Joiner::Compare { .. } | Joiner::Overlapping { .. } => {
                if has_equal || indexed_range {
                    true
                } else {
                    // The first range joiner backs the index.
                    indexed_range = true;
                    false
                }
            }
            Joiner::Filtering(_) => true,
        })
        .cloned()
        .collect()
}
