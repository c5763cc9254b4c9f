//! Grouped streams: one element per group key, carrying an aggregate.

use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::{ImpactType, Value};

use crate::constraint::ConstraintKind;

use super::collector::{Aggregate, Collector};
use super::{ConstraintBuilder, GroupWeightFn, KeyUniverseFn, UniKeyFn, UniPredicate};

/// Stream over `(key, aggregate)` groups.
///
/// Without `complement`, only keys with at least one member exist. The
/// load-balance collector terminates into a single solution-wide match
/// weighing the unfairness across groups.
pub struct GroupedStream<Sc: Score> {
    class: usize,
    filters: Vec<UniPredicate<Sc>>,
    key: UniKeyFn<Sc>,
    collector: Collector<Sc>,
    complement: Option<KeyUniverseFn<Sc>>,
}

impl<Sc: Score> GroupedStream<Sc> {
    pub(crate) fn new(
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        key: UniKeyFn<Sc>,
        collector: Collector<Sc>,
    ) -> Self {
        Self {
            class,
            filters,
            key,
            collector,
            complement: None,
        }
    }

    /// Pins every key of the given universe, so empty groups still match
    /// with their collector's neutral aggregate.
    pub fn complement(
        mut self,
        universe: impl Fn(&Solution<Sc>) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        self.complement = Some(Arc::new(universe));
        self
    }

    /// Penalizes each group by a constant weight.
    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(move |_, _| weight))
    }

    /// Penalizes each group by a weight of its key and aggregate.
    pub fn penalize_by(
        self,
        weight: impl Fn(&Value, &Aggregate) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, Arc::new(weight))
    }

    /// Rewards each group by a constant weight.
    pub fn reward(self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(move |_, _| weight))
    }

    /// Rewards each group by a weight of its key and aggregate.
    pub fn reward_by(
        self,
        weight: impl Fn(&Value, &Aggregate) -> Sc + Send + Sync + 'static,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, Arc::new(weight))
    }

    fn terminal(self, impact: ImpactType, weight: GroupWeightFn<Sc>) -> ConstraintBuilder<Sc> {
        let kind = match self.collector {
            Collector::LoadBalance(metric) => ConstraintKind::Balance {
                class: self.class,
                filters: self.filters,
                key: self.key,
                metric,
                complement: self.complement,
                weight,
            },
            collector => ConstraintKind::Grouped {
                class: self.class,
                filters: self.filters,
                key: self.key,
                collector,
                complement: self.complement,
                weight,
            },
        };
        ConstraintBuilder { impact, kind }
    }
}
