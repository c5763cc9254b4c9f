//! Uni streams: one entity per stream element.

use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_core::{ImpactType, Value};

use crate::constraint::ConstraintKind;

use super::collector::Collector;
use super::joiner::Joiner;
use super::{
    BiStream, ConstraintBuilder, ConstraintFactory, GroupedStream, UniKeyFn, UniPredicate,
    UniWeightFn,
};

/// Stream over every entity of one class.
#[derive(Clone)]
pub struct UniStream<Sc: Score> {
    factory: ConstraintFactory<Sc>,
    class: usize,
    filters: Vec<UniPredicate<Sc>>,
}

impl<Sc: Score> UniStream<Sc> {
    pub(crate) fn new(factory: ConstraintFactory<Sc>, class: usize) -> Self {
        Self {
            factory,
            class,
            filters: Vec::new(),
        }
    }

    /// Keeps only entities passing the predicate.
    pub fn filter(
        mut self,
        predicate: impl Fn(&Solution<Sc>, usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filters.push(Arc::new(predicate));
        self
    }

    /// Joins against another class; the uni filters accumulated so far
    /// apply to the left side.
    pub fn join(self, other_class: &str, joiners: Vec<Joiner<Sc>>) -> Result<BiStream<Sc>> {
        let class_b = self.factory.resolve_class(other_class)?;
        Ok(BiStream::new_cross(
            self.class,
            class_b,
            self.filters,
            joiners,
        ))
    }

    /// Keeps entities for which a matching other entity exists.
    pub fn if_exists(
        self,
        other_class: &str,
        joiners: Vec<Joiner<Sc>>,
    ) -> Result<ExistsStream<Sc>> {
        self.exists(other_class, joiners, false)
    }

    /// Keeps entities for which no matching other entity exists.
    pub fn if_not_exists(
        self,
        other_class: &str,
        joiners: Vec<Joiner<Sc>>,
    ) -> Result<ExistsStream<Sc>> {
        self.exists(other_class, joiners, true)
    }

    fn exists(
        self,
        other_class: &str,
        joiners: Vec<Joiner<Sc>>,
        negated: bool,
    ) -> Result<ExistsStream<Sc>> {
        let other_class = self.factory.resolve_class(other_class)?;
        Ok(ExistsStream {
            class: self.class,
            filters: self.filters,
            other_class,
            joiners,
            negated,
        })
    }

    /// Groups entities by a key and aggregates each group.
    pub fn group_by(
        self,
        key: impl Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
        collector: Collector<Sc>,
    ) -> GroupedStream<Sc> {
        GroupedStream::new(self.class, self.filters, Arc::new(key), collector)
    }

    /// Transforms each entity into a value for downstream filtering,
    /// grouping or weighting.
    pub fn map(
        self,
        mapper: impl Fn(&Solution<Sc>, usize) -> Value + Send + Sync + 'static,
    ) -> MappedStream<Sc> {
        MappedStream {
            class: self.class,
            filters: self.filters,
            mapper: Arc::new(mapper),
        }
    }

    /// Penalizes each match by a constant weight.
    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(move |_, _| weight))
    }

    /// Penalizes each match by an entity-dependent weight.
    pub fn penalize_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(weight))
    }

    /// Rewards each match by a constant weight.
    pub fn reward(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(move |_, _| weight))
    }

    /// Rewards each match by an entity-dependent weight.
    pub fn reward_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(weight))
    }

    /// Adds a signed, entity-dependent impact (positive improves the score).
    pub fn impact_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(weight))
    }

    fn terminal(self, impact: ImpactType, weight: UniWeightFn<Sc>) -> ConstraintBuilder<Sc> {
        ConstraintBuilder {
            impact,
            kind: ConstraintKind::Uni {
                class: self.class,
                filters: self.filters,
                weight,
            },
        }
    }
}

/// Uni stream conditioned on the (non-)existence of a matching entity of
/// another class. Terminals weigh the conditioned entity alone.
pub struct ExistsStream<Sc: Score> {
    class: usize,
    filters: Vec<UniPredicate<Sc>>,
    other_class: usize,
    joiners: Vec<Joiner<Sc>>,
    negated: bool,
}

impl<Sc: Score> ExistsStream<Sc> {
    /// Narrows the conditioned side further.
    pub fn filter(
        mut self,
        predicate: impl Fn(&Solution<Sc>, usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filters.push(Arc::new(predicate));
        self
    }

    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(move |_, _| weight))
    }

    pub fn penalize_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(weight))
    }

    pub fn reward(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(move |_, _| weight))
    }

    pub fn reward_by(
        self,
        weight: impl Fn(&Solution<Sc>, usize) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(weight))
    }

    fn terminal(self, impact: ImpactType, weight: UniWeightFn<Sc>) -> ConstraintBuilder<Sc> {
        ConstraintBuilder {
            impact,
            kind: ConstraintKind::Exists {
                class: self.class,
                filters: self.filters,
                other_class: self.other_class,
                joiners: self.joiners,
                negated: self.negated,
                weight,
            },
        }
    }
}

/// Uni stream whose elements were mapped to plain values.
pub struct MappedStream<Sc: Score> {
    class: usize,
    filters: Vec<UniPredicate<Sc>>,
    mapper: UniKeyFn<Sc>,
}

impl<Sc: Score> MappedStream<Sc> {
    /// Filters on the mapped value.
    pub fn filter(
        mut self,
        predicate: impl Fn(&Solution<Sc>, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        let mapper = Arc::clone(&self.mapper);
        self.filters
            .push(Arc::new(move |sol, e| predicate(sol, &mapper(sol, e))));
        self
    }

    /// Groups by the mapped value.
    pub fn group_by(self, collector: Collector<Sc>) -> GroupedStream<Sc> {
        GroupedStream::new(self.class, self.filters, self.mapper, collector)
    }

    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(move |_, _| weight))
    }

    /// Penalizes by a weight of the mapped value.
    pub fn penalize_by(
        self,
        weight: impl Fn(&Solution<Sc>, &Value) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        let mapper = Arc::clone(&self.mapper);
        self.terminal(
            ImpactType::Penalty,
            Arc::new(move |sol, e| weight(sol, &mapper(sol, e))),
        )
    }

    pub fn reward_by(
        self,
        weight: impl Fn(&Solution<Sc>, &Value) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        let mapper = Arc::clone(&self.mapper);
        self.terminal(
            ImpactType::Reward,
            Arc::new(move |sol, e| weight(sol, &mapper(sol, e))),
        )
    }

    fn terminal(self, impact: ImpactType, weight: UniWeightFn<Sc>) -> ConstraintBuilder<Sc> {
        ConstraintBuilder {
            impact,
            kind: ConstraintKind::Uni {
                class: self.class,
                filters: self.filters,
                weight,
            },
        }
    }
}
