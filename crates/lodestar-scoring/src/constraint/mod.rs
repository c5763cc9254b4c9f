//! Compiled incremental constraints.
//!
//! A stream pipeline compiles into one of a few constraint shapes, each
//! carrying its own indexes and match bookkeeping. Instances are stateful
//! and owned by one score director; the shared [`Constraint`] definition is
//! cheap to clone and can compile fresh instances for concurrent sessions.

mod balance;
mod cross;
mod exists;
mod grouped;
mod indexes;
mod pair;
mod uni;

pub(crate) use balance::BalanceConstraint;
pub(crate) use cross::CrossConstraint;
pub(crate) use exists::ExistsConstraint;
pub(crate) use grouped::GroupedConstraint;
pub(crate) use pair::PairConstraint;
pub(crate) use uni::UniConstraint;

pub(crate) use indexes::JoinIndex;

use lodestar_core::domain::Solution;
use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};

use crate::analysis::ConstraintMatch;
use crate::stream::collector::Collector;
use crate::stream::joiner::Joiner;
use crate::stream::{
    GroupWeightFn, KeyUniverseFn, PairWeightFn, UniKeyFn, UniPredicate, UniWeightFn,
};

/// Incremental evaluation protocol shared by all compiled constraints.
///
/// The director retracts every affected entity before a mutation and
/// re-inserts it afterwards; both calls return the signed score delta.
/// `evaluate` recomputes from scratch without touching internal state and
/// backs the assertion mode.
pub trait IncrementalConstraint<Sc: Score>: Send + Sync + std::fmt::Debug {
    fn constraint_ref(&self) -> &ConstraintRef;

    /// Entity classes whose changes can affect this constraint.
    fn source_classes(&self) -> &[usize];

    /// Builds internal indexes from the full solution, returning its score.
    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc>;

    /// Stateless from-scratch recomputation.
    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc>;

    /// Removes one entity, before its fields change.
    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc>;

    /// Re-adds one entity, after its fields changed.
    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc>;

    /// All current matches, for analysis.
    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>>;
}

/// Applies the impact direction to a base weight.
#[inline]
pub(crate) fn signed<Sc: Score>(impact: ImpactType, base: Sc) -> Sc {
    match impact {
        ImpactType::Penalty => -base,
        ImpactType::Reward => base,
    }
}

/// The compiled shape of one constraint definition.
#[derive(Clone)]
pub(crate) enum ConstraintKind<Sc: Score> {
    Uni {
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        weight: UniWeightFn<Sc>,
    },
    /// Unique pairs within one class: (earlier, later), n(n-1)/2 candidates.
    Pair {
        class: usize,
        joiners: Vec<Joiner<Sc>>,
        weight: PairWeightFn<Sc>,
    },
    /// Cross-class join.
    Cross {
        class_a: usize,
        class_b: usize,
        joiners: Vec<Joiner<Sc>>,
        weight: PairWeightFn<Sc>,
    },
    /// Uni stream conditioned on (non-)existence of a matching other entity.
    Exists {
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        other_class: usize,
        joiners: Vec<Joiner<Sc>>,
        negated: bool,
        weight: UniWeightFn<Sc>,
    },
    Grouped {
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        key: UniKeyFn<Sc>,
        collector: Collector<Sc>,
        complement: Option<KeyUniverseFn<Sc>>,
        weight: GroupWeightFn<Sc>,
    },
    /// Load balance across groups; weight applied once to the unfairness.
    Balance {
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        key: UniKeyFn<Sc>,
        metric: crate::stream::MetricFn<Sc>,
        complement: Option<KeyUniverseFn<Sc>>,
        weight: GroupWeightFn<Sc>,
    },
}

/// A named, compiled-on-demand constraint definition.
#[derive(Clone)]
pub struct Constraint<Sc: Score> {
    pub(crate) constraint_ref: ConstraintRef,
    pub(crate) impact: ImpactType,
    pub(crate) kind: ConstraintKind<Sc>,
}

impl<Sc: Score> Constraint<Sc> {
    pub fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    /// Entity classes this constraint sources.
    pub fn source_classes(&self) -> Vec<usize> {
        match &self.kind {
            ConstraintKind::Uni { class, .. }
            | ConstraintKind::Pair { class, .. }
            | ConstraintKind::Grouped { class, .. }
            | ConstraintKind::Balance { class, .. } => vec![*class],
            ConstraintKind::Cross { class_a, class_b, .. } => {
                if class_a == class_b {
                    vec![*class_a]
                } else {
                    vec![*class_a, *class_b]
                }
            }
            ConstraintKind::Exists { class, other_class, .. } => {
                if class == other_class {
                    vec![*class]
                } else {
                    vec![*class, *other_class]
                }
            }
        }
    }

    /// Instantiates fresh incremental state for one director.
    pub fn compile(&self) -> Box<dyn IncrementalConstraint<Sc>> {
        let cref = self.constraint_ref.clone();
        let impact = self.impact;
        match self.kind.clone() {
            ConstraintKind::Uni { class, filters, weight } => {
                Box::new(UniConstraint::new(cref, impact, class, filters, weight))
            }
            ConstraintKind::Pair { class, joiners, weight } => {
                Box::new(PairConstraint::new(cref, impact, class, joiners, weight))
            }
            ConstraintKind::Cross { class_a, class_b, joiners, weight } => Box::new(
                CrossConstraint::new(cref, impact, class_a, class_b, joiners, weight),
            ),
            ConstraintKind::Exists {
                class,
                filters,
                other_class,
                joiners,
                negated,
                weight,
            } => Box::new(ExistsConstraint::new(
                cref,
                impact,
                class,
                filters,
                other_class,
                joiners,
                negated,
                weight,
            )),
            ConstraintKind::Grouped {
                class,
                filters,
                key,
                collector,
                complement,
                weight,
            } => Box::new(GroupedConstraint::new(
                cref, impact, class, filters, key, collector, complement, weight,
            )),
            ConstraintKind::Balance {
                class,
                filters,
                key,
                metric,
                complement,
                weight,
            } => Box::new(BalanceConstraint::new(
                cref, impact, class, filters, key, metric, complement, weight,
            )),
        }
    }
}

impl<Sc: Score> std::fmt::Debug for Constraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ConstraintKind::Uni { .. } => "Uni",
            ConstraintKind::Pair { .. } => "Pair",
            ConstraintKind::Cross { .. } => "Cross",
            ConstraintKind::Exists { negated: false, .. } => "IfExists",
            ConstraintKind::Exists { negated: true, .. } => "IfNotExists",
            ConstraintKind::Grouped { .. } => "Grouped",
            ConstraintKind::Balance { .. } => "Balance",
        };
        f.debug_struct("Constraint")
            .field("name", &self.constraint_ref.full_name())
            .field("impact", &self.impact)
            .field("kind", &kind)
            .finish()
    }
}
