//! Existence-conditioned uni constraint (`if_exists` / `if_not_exists`).
//!
//! An A entity matches when at least one (or, negated, no) B entity passes
//! the joiners against it. Contributions are cached per A entity so a B-side
//! change can be settled by recomputing only the affected key bucket.

use std::collections::HashMap;

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};

use crate::analysis::{ConstraintMatch, EntityRef};
use crate::stream::joiner::Joiner;
use crate::stream::{UniPredicate, UniWeightFn};

use super::indexes::{residual_joiners, JoinIndex, Side};
use super::{signed, IncrementalConstraint};

pub struct ExistsConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: Vec<usize>,
    class: usize,
    other_class: usize,
    filters: Vec<UniPredicate<Sc>>,
    joiners: Vec<Joiner<Sc>>,
    residual: Vec<Joiner<Sc>>,
    negated: bool,
    weight: UniWeightFn<Sc>,
    /// A-side members, probed when a B entity changes.
    index_a: JoinIndex<Sc>,
    /// B-side members, probed per A entity for the existence check.
    index_b: JoinIndex<Sc>,
    /// Cached signed contribution per currently matching A entity.
    contributions: HashMap<usize, Sc>,
}

impl<Sc: Score> ExistsConstraint<Sc> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        other_class: usize,
        joiners: Vec<Joiner<Sc>>,
        negated: bool,
        weight: UniWeightFn<Sc>,
    ) -> Self {
        let sources = if class == other_class {
            vec![class]
        } else {
            vec![class, other_class]
        };
        let index_a = JoinIndex::new(&joiners, Side::Left);
        let index_b = JoinIndex::new(&joiners, Side::Right);
        let residual = residual_joiners(&joiners);
        Self {
            constraint_ref,
            impact,
            sources,
            class,
            other_class,
            filters,
            joiners,
            residual,
            negated,
            weight,
            index_a,
            index_b,
            contributions: HashMap::new(),
        }
    }

    fn passes_filters(&self, solution: &Solution<Sc>, a: usize) -> bool {
        self.filters.iter().all(|f| f(solution, a))
    }

    /// Existence check against the current B index.
    fn condition_met(&self, solution: &Solution<Sc>, a: usize) -> bool {
        let exists = self.index_b.candidates(solution, a).into_iter().any(|b| {
            if self.class == self.other_class && a == b {
                return false;
            }
            self.residual.iter().all(|j| j.holds(solution, a, b))
        });
        exists != self.negated
    }

    /// Existence check without indexes, for the stateless path.
    fn condition_met_scan(&self, solution: &Solution<Sc>, a: usize) -> bool {
        let exists = (0..solution.entities[self.other_class].len()).any(|b| {
            if self.class == self.other_class && a == b {
                return false;
            }
            self.joiners.iter().all(|j| j.holds(solution, a, b))
        });
        exists != self.negated
    }

    fn contribution(&self, solution: &Solution<Sc>, a: usize) -> Option<Sc> {
        (self.passes_filters(solution, a) && self.condition_met(solution, a))
            .then(|| signed(self.impact, (self.weight)(solution, a)))
    }

    /// Re-settles one A entity's cached contribution, returning the delta.
    fn resettle(&mut self, solution: &Solution<Sc>, a: usize) -> Result<Sc> {
        let old = self.contributions.remove(&a).unwrap_or_else(Sc::zero);
        let new = self.contribution(solution, a).unwrap_or_else(Sc::zero);
        if new != Sc::zero() {
            self.contributions.insert(a, new);
        }
        new.checked_sub(&old).ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for ExistsConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.index_a.clear();
        self.index_b.clear();
        self.contributions.clear();
        for a in 0..solution.entities[self.class].len() {
            self.index_a.insert(solution, a);
        }
        for b in 0..solution.entities[self.other_class].len() {
            self.index_b.insert(solution, b);
        }
        let mut total = Sc::zero();
        for a in 0..solution.entities[self.class].len() {
            if let Some(c) = self.contribution(solution, a) {
                self.contributions.insert(a, c);
                total = total.checked_add(&c).ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let mut total = Sc::zero();
        for a in 0..solution.entities[self.class].len() {
            if self.passes_filters(solution, a) && self.condition_met_scan(solution, a) {
                total = total
                    .checked_add(&signed(self.impact, (self.weight)(solution, a)))
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        let mut delta = Sc::zero();
        if class == self.class {
            self.index_a.remove(solution, entity);
            let old = self.contributions.remove(&entity).unwrap_or_else(Sc::zero);
            delta = delta.checked_sub(&old).ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        if class == self.other_class {
            self.index_b.remove(solution, entity);
            // The disappearance of this B may flip A entities in its bucket.
            for a in self.index_a.candidates(solution, entity) {
                delta = delta
                    .checked_add(&self.resettle(solution, a)?)
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(delta)
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        let mut delta = Sc::zero();
        if class == self.class {
            if let Some(c) = self.contribution(solution, entity) {
                self.contributions.insert(entity, c);
                delta = delta.checked_add(&c).ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
            self.index_a.insert(solution, entity);
        }
        if class == self.other_class {
            self.index_b.insert(solution, entity);
            for a in self.index_a.candidates(solution, entity) {
                if self.class == self.other_class && a == entity {
                    continue;
                }
                delta = delta
                    .checked_add(&self.resettle(solution, a)?)
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(delta)
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let mut out = Vec::new();
        for a in 0..solution.entities[self.class].len() {
            if !(self.passes_filters(solution, a) && self.condition_met_scan(solution, a)) {
                continue;
            }
            let id = solution.entities[self.class][a].id;
            out.push(ConstraintMatch::new(
                self.constraint_ref.clone(),
                signed(self.impact, (self.weight)(solution, a)),
                vec![EntityRef::new(self.class, a, id)],
                format!("entity id={id}"),
            ));
        }
        Ok(out)
    }
}

impl<Sc: Score> std::fmt::Debug for ExistsConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExistsConstraint")
            .field("name", &self.constraint_ref.name)
            .field("negated", &self.negated)
            .field("class", &self.class)
            .field("other_class", &self.other_class)
            .finish()
    }
}
