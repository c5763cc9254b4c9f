//! Load-balance constraint: one match per solution, weighted by the
//! unfairness of an integer load across group keys.
//!
//! Unfairness is the square root of the sum of squared deviations from the
//! mean load, maintained from running sum and sum-of-squares so each entity
//! change settles in O(1). A complement universe counts unloaded keys into
//! the mean, which is what makes "spread work over everyone" constraints
//! honest about idle members.

use std::collections::{HashMap, HashSet};

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};
use lodestar_core::Value;

use crate::analysis::ConstraintMatch;
use crate::stream::collector::Aggregate;
use crate::stream::{GroupWeightFn, KeyUniverseFn, MetricFn, UniKeyFn, UniPredicate};

use super::{signed, IncrementalConstraint};

#[derive(Debug, Default)]
struct Loads {
    per_key: HashMap<Value, (usize, i64)>,
    sum: i64,
    sum_sq: i64,
}

impl Loads {
    fn clear(&mut self) {
        self.per_key.clear();
        self.sum = 0;
        self.sum_sq = 0;
    }

    fn seed(&mut self, key: Value) {
        self.per_key.entry(key).or_insert((0, 0));
    }

    /// `None` when the running sums overflow i64.
    fn apply(&mut self, key: &Value, members_diff: isize, load_diff: i64, pinned: bool) -> Option<()> {
        let (members, load) = self.per_key.get(key).copied().unwrap_or((0, 0));
        let new_members = (members as isize + members_diff) as usize;
        let new_load = load.checked_add(load_diff)?;
        let sq_diff = new_load
            .checked_mul(new_load)?
            .checked_sub(load.checked_mul(load)?)?;
        self.sum = self.sum.checked_add(load_diff)?;
        self.sum_sq = self.sum_sq.checked_add(sq_diff)?;
        if new_members == 0 && !pinned {
            self.per_key.remove(key);
        } else {
            self.per_key.insert(key.clone(), (new_members, new_load));
        }
        Some(())
    }

    /// sqrt(sum_sq - sum^2 / n), rounded to i64. Zero when perfectly even.
    fn unfairness(&self) -> i64 {
        let n = self.per_key.len();
        if n == 0 {
            return 0;
        }
        let sum = self.sum as f64;
        let deviation = self.sum_sq as f64 - sum * sum / n as f64;
        deviation.max(0.0).sqrt().round() as i64
    }
}

pub struct BalanceConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: [usize; 1],
    filters: Vec<UniPredicate<Sc>>,
    key: UniKeyFn<Sc>,
    metric: MetricFn<Sc>,
    complement: Option<KeyUniverseFn<Sc>>,
    weight: GroupWeightFn<Sc>,
    loads: Loads,
    universe_keys: HashSet<Value>,
    cached: Sc,
}

impl<Sc: Score> BalanceConstraint<Sc> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        key: UniKeyFn<Sc>,
        metric: MetricFn<Sc>,
        complement: Option<KeyUniverseFn<Sc>>,
        weight: GroupWeightFn<Sc>,
    ) -> Self {
        Self {
            constraint_ref,
            impact,
            sources: [class],
            filters,
            key,
            metric,
            complement,
            weight,
            loads: Loads::default(),
            universe_keys: HashSet::new(),
            cached: Sc::zero(),
        }
    }

    fn passes_filters(&self, solution: &Solution<Sc>, entity: usize) -> bool {
        self.filters.iter().all(|f| f(solution, entity))
    }

    fn contribution(&self) -> Sc {
        let unfairness = self.loads.unfairness();
        signed(
            self.impact,
            (self.weight)(&Value::None, &Aggregate::Sum(unfairness)),
        )
    }

    /// Returns the change of the single solution-wide contribution.
    fn resettle(&mut self) -> Result<Sc> {
        let new = self.contribution();
        let delta = new.checked_sub(&self.cached).ok_or_else(|| self.overflow())?;
        self.cached = new;
        Ok(delta)
    }

    fn overflow(&self) -> SolverError {
        SolverError::ScoreOverflow(self.constraint_ref.full_name())
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for BalanceConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.loads.clear();
        self.universe_keys.clear();
        if let Some(universe) = &self.complement {
            for key in universe(solution) {
                self.universe_keys.insert(key.clone());
                self.loads.seed(key);
            }
        }
        let class = self.sources[0];
        for entity in 0..solution.entities[class].len() {
            if !self.passes_filters(solution, entity) {
                continue;
            }
            let key = (self.key)(solution, entity);
            let load = (self.metric)(solution, entity);
            let pinned = self.universe_keys.contains(&key);
            self.loads
                .apply(&key, 1, load, pinned)
                .ok_or_else(|| self.overflow())?;
        }
        self.cached = self.contribution();
        Ok(self.cached)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let mut loads = Loads::default();
        let mut universe_keys = HashSet::new();
        if let Some(universe) = &self.complement {
            for key in universe(solution) {
                universe_keys.insert(key.clone());
                loads.seed(key);
            }
        }
        let class = self.sources[0];
        for entity in 0..solution.entities[class].len() {
            if !self.passes_filters(solution, entity) {
                continue;
            }
            let key = (self.key)(solution, entity);
            let load = (self.metric)(solution, entity);
            let pinned = universe_keys.contains(&key);
            loads
                .apply(&key, 1, load, pinned)
                .ok_or_else(|| self.overflow())?;
        }
        let unfairness = loads.unfairness();
        Ok(signed(
            self.impact,
            (self.weight)(&Value::None, &Aggregate::Sum(unfairness)),
        ))
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.passes_filters(solution, entity) {
            return Ok(Sc::zero());
        }
        let key = (self.key)(solution, entity);
        let load = (self.metric)(solution, entity);
        let pinned = self.universe_keys.contains(&key);
        let negated = load.checked_neg().ok_or_else(|| self.overflow())?;
        self.loads
            .apply(&key, -1, negated, pinned)
            .ok_or_else(|| self.overflow())?;
        self.resettle()
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.passes_filters(solution, entity) {
            return Ok(Sc::zero());
        }
        let key = (self.key)(solution, entity);
        let load = (self.metric)(solution, entity);
        let pinned = self.universe_keys.contains(&key);
        self.loads
            .apply(&key, 1, load, pinned)
            .ok_or_else(|| self.overflow())?;
        self.resettle()
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let score = self.evaluate(solution)?;
        if score == Sc::zero() {
            return Ok(Vec::new());
        }
        Ok(vec![ConstraintMatch::new(
            self.constraint_ref.clone(),
            score,
            Vec::new(),
            "load balance".to_string(),
        )])
    }
}

impl<Sc: Score> std::fmt::Debug for BalanceConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceConstraint")
            .field("name", &self.constraint_ref.name)
            .field("class", &self.sources[0])
            .field("keys", &self.loads.per_key.len())
            .finish()
    }
}
