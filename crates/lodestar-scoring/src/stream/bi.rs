//! Bi streams: candidate pairs, joined or unique within one class.

use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::ImpactType;

use crate::constraint::ConstraintKind;

use super::joiner::Joiner;
use super::{ConstraintBuilder, PairWeightFn, UniPredicate};

/// Stream over entity pairs.
///
/// Unique-pair streams pair distinct entities of one class once each, with
/// the earlier entity on the left. Cross streams pair every left entity
/// with every right entity, including an entity with itself when both
/// sides are the same class.
pub struct BiStream<Sc: Score> {
    class_a: usize,
    class_b: usize,
    unique: bool,
    joiners: Vec<Joiner<Sc>>,
}

impl<Sc: Score> BiStream<Sc> {
    pub(crate) fn new_unique_pair(class: usize, joiners: Vec<Joiner<Sc>>) -> Self {
        Self {
            class_a: class,
            class_b: class,
            unique: true,
            joiners,
        }
    }

    pub(crate) fn new_cross(
        class_a: usize,
        class_b: usize,
        left_filters: Vec<UniPredicate<Sc>>,
        mut joiners: Vec<Joiner<Sc>>,
    ) -> Self {
        // Left-side uni filters become pair predicates ignoring the right.
        for filter in left_filters {
            joiners.push(Joiner::Filtering(Arc::new(move |sol, a, _b| {
                (filter)(sol, a)
            })));
        }
        Self {
            class_a,
            class_b,
            unique: false,
            joiners,
        }
    }

    /// Keeps only pairs passing the predicate.
    pub fn filter(
        mut self,
        predicate: impl Fn(&Solution<Sc>, usize, usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.joiners.push(Joiner::Filtering(Arc::new(predicate)));
        self
    }

    /// Penalizes each matched pair by a constant weight.
    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(move |_, _, _| weight))
    }

    /// Penalizes each matched pair by a pair-dependent weight.
    pub fn penalize_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(weight))
    }

    /// Rewards each matched pair by a constant weight.
    pub fn reward(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(move |_, _, _| weight))
    }

    /// Rewards each matched pair by a pair-dependent weight.
    pub fn reward_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(weight))
    }

    fn terminal(self, impact: ImpactType, weight: PairWeightFn<Sc>) -> ConstraintBuilder<Sc> {
        let kind = if self.unique {
            ConstraintKind::Pair {
                class: self.class_a,
                joiners: self.joiners,
                weight,
            }
        } else {
            ConstraintKind::Cross {
                class_a: self.class_a,
                class_b: self.class_b,
                joiners: self.joiners,
                weight,
            }
        };
        ConstraintBuilder { impact, kind }
    }
}
