//! Stateless single-class constraint: filter chain plus weight.

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};

use crate::analysis::{ConstraintMatch, EntityRef};
use crate::stream::{UniPredicate, UniWeightFn};

use super::{signed, IncrementalConstraint};

pub struct UniConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: [usize; 1],
    filters: Vec<UniPredicate<Sc>>,
    weight: UniWeightFn<Sc>,
}

impl<Sc: Score> UniConstraint<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class: usize,
        filters: Vec<UniPredicate<Sc>>,
        weight: UniWeightFn<Sc>,
    ) -> Self {
        Self {
            constraint_ref,
            impact,
            sources: [class],
            filters,
            weight,
        }
    }

    fn matches(&self, solution: &Solution<Sc>, entity: usize) -> bool {
        self.filters.iter().all(|f| f(solution, entity))
    }

    fn delta(&self, solution: &Solution<Sc>, entity: usize) -> Sc {
        signed(self.impact, (self.weight)(solution, entity))
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for UniConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.evaluate(solution)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let class = self.sources[0];
        let mut total = Sc::zero();
        for entity in 0..solution.entities[class].len() {
            if self.matches(solution, entity) {
                total = total
                    .checked_add(&self.delta(solution, entity))
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.matches(solution, entity) {
            return Ok(Sc::zero());
        }
        Ok(-self.delta(solution, entity))
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] || !self.matches(solution, entity) {
            return Ok(Sc::zero());
        }
        Ok(self.delta(solution, entity))
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let class = self.sources[0];
        let mut out = Vec::new();
        for entity in 0..solution.entities[class].len() {
            if !self.matches(solution, entity) {
                continue;
            }
            let id = solution.entities[class][entity].id;
            out.push(ConstraintMatch::new(
                self.constraint_ref.clone(),
                self.delta(solution, entity),
                vec![EntityRef::new(class, entity, id)],
                format!("entity id={id}"),
            ));
        }
        Ok(out)
    }
}

impl<Sc: Score> std::fmt::Debug for UniConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniConstraint")
            .field("name", &self.constraint_ref.name)
            .field("impact", &self.impact)
            .field("class", &self.sources[0])
            .finish()
    }
}
