//! Group-by constraint: entities bucketed by a key, one weighted match per
//! group over the collector's aggregate.
//!
//! With a `complement` universe, keys without members still form (empty)
//! groups, so "nobody assigned here" can be penalized.

use std::collections::{HashMap, HashSet};

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};
use lodestar_core::Value;

use crate::analysis::{ConstraintMatch, EntityRef};
use crate::stream::collector::{Collector, GroupState};
use crate::stream::{GroupWeightFn, KeyUniverseFn, UniKeyFn, UniPredicate};

use super::{signed, IncrementalConstraint};

pub struct GroupedConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: [usize; 1],
    filters: Vec<UniPredicate<Sc>>,
    key: UniKeyFn<Sc>,
    collector: Collector<Sc>,
    complement: Option<KeyUniverseFn<Sc>>,
    weight: GroupWeightFn<Sc>,
    groups: HashMap<Value, GroupState>,
    /// Keys of the complement universe; empty groups persist only for these.
    universe_keys: HashSet<Value>,
    /// Cached signed contribution per group key.
    contributions: HashMap<Value, Sc>,
}

impl<Sc: Score> GroupedConstraint<Sc> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        key: UniKeyFn<Sc>,
        collector: Collector<Sc>,
        complement: Option<KeyUniverseFn<Sc>>,
        weight: GroupWeightFn<Sc>,
    ) -> Self {
        Self {
            constraint_ref,
            impact,
            sources: [class],
            filters,
            key,
            collector,
            complement,
            weight,
            groups: HashMap::new(),
            universe_keys: HashSet::new(),
            contributions: HashMap::new(),
        }
    }

    fn passes_filters(&self, solution: &Solution<Sc>, entity: usize) -> bool {
        self.filters.iter().all(|f| f(solution, entity))
    }

    fn accumulate(state: &mut GroupState, collector: &Collector<Sc>, solution: &Solution<Sc>, entity: usize) {
        state.members += 1;
        match collector {
            Collector::Count => {}
            Collector::Sum(metric) | Collector::LoadBalance(metric) => {
                state.sum += metric(solution, entity);
            }
            Collector::Min(key) | Collector::Max(key) => {
                state.add_value(key(solution, entity));
            }
            Collector::ToList(value) | Collector::ToSet(value) => {
                state.add_value(value(solution, entity));
            }
        }
    }

    fn retract(state: &mut GroupState, collector: &Collector<Sc>, solution: &Solution<Sc>, entity: usize) {
        state.members -= 1;
        match collector {
            Collector::Count => {}
            Collector::Sum(metric) | Collector::LoadBalance(metric) => {
                state.sum -= metric(solution, entity);
            }
            Collector::Min(key) | Collector::Max(key) => {
                state.remove_value(&key(solution, entity));
            }
            Collector::ToList(value) | Collector::ToSet(value) => {
                state.remove_value(&value(solution, entity));
            }
        }
    }

    /// Recomputes one group's cached contribution, returning the delta.
    ///
    /// Empty groups keep a (possibly nonzero) contribution only when a
    /// complement universe pins them; otherwise they are dropped.
    fn resettle_group(&mut self, key: &Value) -> Result<Sc> {
        let old = self.contributions.remove(key).unwrap_or_else(Sc::zero);
        let pinned = self.universe_keys.contains(key);
        let new = match self.groups.get(key) {
            Some(state) if !state.is_empty() || pinned => {
                let aggregate = state.aggregate(&self.collector);
                signed(self.impact, (self.weight)(key, &aggregate))
            }
            _ => Sc::zero(),
        };
        if let Some(state) = self.groups.get(key) {
            if state.is_empty() && !pinned {
                self.groups.remove(key);
            }
        }
        if new != Sc::zero() {
            self.contributions.insert(key.clone(), new);
        }
        new.checked_sub(&old).ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for GroupedConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.groups.clear();
        self.contributions.clear();
        self.universe_keys.clear();
        if let Some(universe) = &self.complement {
            for key in universe(solution) {
                self.universe_keys.insert(key.clone());
                self.groups.entry(key).or_default();
            }
        }
        let class = self.sources[0];
        for entity in 0..solution.entities[class].len() {
            if !self.passes_filters(solution, entity) {
                continue;
            }
            let key = (self.key)(solution, entity);
            let state = self.groups.entry(key).or_default();
            Self::accumulate(state, &self.collector, solution, entity);
        }
        let keys: Vec<Value> = self.groups.keys().cloned().collect();
        let mut total = Sc::zero();
        for key in keys {
            total = total
                .checked_add(&self.resettle_group(&key)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        Ok(total)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let mut groups: HashMap<Value, GroupState> = HashMap::new();
        let mut universe_keys: HashSet<Value> = HashSet::new();
        if let Some(universe) = &self.complement {
            for key in universe(solution) {
                universe_keys.insert(key.clone());
                groups.entry(key).or_default();
            }
        }
        let class = self.sources[0];
        for entity in 0..solution.entities[class].len() {
            if !self.passes_filters(solution, entity) {
                continue;
            }
            let key = (self.key)(solution, entity);
            let state = groups.entry(key).or_default();
            Self::accumulate(state, &self.collector, solution, entity);
        }
        let mut total = Sc::zero();
        for (key, state) in &groups {
            if state.is_empty() && !universe_keys.contains(key) {
                continue;
            }
            let aggregate = state.aggregate(&self.collector);
            total = total
                .checked_add(&signed(self.impact, (self.weight)(key, &aggregate)))
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        Ok(total)
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.passes_filters(solution, entity) {
            return Ok(Sc::zero());
        }
        let key = (self.key)(solution, entity);
        if let Some(state) = self.groups.get_mut(&key) {
            Self::retract(state, &self.collector, solution, entity);
        }
        self.resettle_group(&key)
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.passes_filters(solution, entity) {
            return Ok(Sc::zero());
        }
        let key = (self.key)(solution, entity);
        let state = self.groups.entry(key.clone()).or_default();
        Self::accumulate(state, &self.collector, solution, entity);
        self.resettle_group(&key)
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let mut groups: HashMap<Value, GroupState> = HashMap::new();
        let mut members: HashMap<Value, Vec<usize>> = HashMap::new();
        let mut universe_keys: HashSet<Value> = HashSet::new();
        if let Some(universe) = &self.complement {
            for key in universe(solution) {
                universe_keys.insert(key.clone());
                groups.entry(key.clone()).or_default();
                members.entry(key).or_default();
            }
        }
        let class = self.sources[0];
        for entity in 0..solution.entities[class].len() {
            if !self.passes_filters(solution, entity) {
                continue;
            }
            let key = (self.key)(solution, entity);
            let state = groups.entry(key.clone()).or_default();
            Self::accumulate(state, &self.collector, solution, entity);
            members.entry(key).or_default().push(entity);
        }
        let mut out = Vec::new();
        for (key, state) in &groups {
            if state.is_empty() && !universe_keys.contains(key) {
                continue;
            }
            let aggregate = state.aggregate(&self.collector);
            let indicted = members
                .get(key)
                .map(|m| {
                    m.iter()
                        .map(|&e| EntityRef::new(class, e, solution.entities[class][e].id))
                        .collect()
                })
                .unwrap_or_default();
            out.push(ConstraintMatch::new(
                self.constraint_ref.clone(),
                signed(self.impact, (self.weight)(key, &aggregate)),
                indicted,
                format!("group key={key:?} members={}", state.members),
            ));
        }
        Ok(out)
    }
}

impl<Sc: Score> std::fmt::Debug for GroupedConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupedConstraint")
            .field("name", &self.constraint_ref.name)
            .field("class", &self.sources[0])
            .field("collector", &self.collector)
            .finish()
    }
}
