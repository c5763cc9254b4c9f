//! The score director: working solution, incremental state, mutation hooks.

use std::sync::Arc;

use tracing::trace;

use lodestar_core::domain::{ShadowPropagator, Solution};
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::Value;

use crate::analysis::{ConstraintAnalysis, ScoreExplanation};
use crate::constraint::IncrementalConstraint;
use crate::set::ConstraintSet;

/// How thoroughly the director double-checks itself while solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentMode {
    /// Incremental scoring only. Deterministic under a fixed seed.
    #[default]
    Reproducible,
    /// Recomputes every constraint from scratch after each mutation and
    /// fails with `ScoreCorruption` on the first divergence. Orders of
    /// magnitude slower; for tests and debugging.
    FullAssert,
}

/// Owns the working solution and keeps per-constraint incremental scores
/// consistent with it.
///
/// All mutations go through [`change_variable`](ScoreDirector::change_variable),
/// [`list_insert`](ScoreDirector::list_insert) and
/// [`list_remove`](ScoreDirector::list_remove). Each bracket retracts every
/// possibly-affected entity from the constraints sourcing its class, applies
/// the change, propagates shadows, then re-inserts. Weight and key closures
/// must read only fields of the entities their stream sources; reaching
/// across to unrelated entities would escape the retract bracket.
pub struct ScoreDirector<Sc: Score> {
    solution: Solution<Sc>,
    definitions: ConstraintSet<Sc>,
    constraints: Vec<Box<dyn IncrementalConstraint<Sc>>>,
    /// Cached score per constraint, same order as `constraints`.
    scores: Vec<Sc>,
    /// Constraint positions sourcing each entity class.
    by_class: Vec<Vec<usize>>,
    propagator: ShadowPropagator,
    mode: EnvironmentMode,
}

impl<Sc: Score> ScoreDirector<Sc> {
    /// Takes ownership of the solution, refreshes all shadows and builds
    /// the incremental state of every constraint.
    pub fn new(
        mut solution: Solution<Sc>,
        definitions: ConstraintSet<Sc>,
        mode: EnvironmentMode,
    ) -> Result<Self> {
        let propagator = ShadowPropagator::new(Arc::clone(solution.registry()));
        propagator.refresh_all(&mut solution);

        let class_count = solution.registry().entity_classes().len();
        let mut by_class = vec![Vec::new(); class_count];
        let mut constraints = Vec::with_capacity(definitions.len());
        let mut scores = Vec::with_capacity(definitions.len());
        for (pos, definition) in definitions.constraints().iter().enumerate() {
            for class in definition.source_classes() {
                by_class[class].push(pos);
            }
            let mut compiled = definition.compile();
            scores.push(compiled.initialize(&solution)?);
            constraints.push(compiled);
        }

        Ok(Self {
            solution,
            definitions,
            constraints,
            scores,
            by_class,
            propagator,
            mode,
        })
    }

    pub fn solution(&self) -> &Solution<Sc> {
        &self.solution
    }

    /// Hands the solution back, score stamped.
    pub fn into_solution(mut self) -> Result<Solution<Sc>> {
        let score = self.calculate_score()?;
        self.solution.score = Some(score);
        Ok(self.solution)
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.mode
    }

    pub fn constraint_set(&self) -> &ConstraintSet<Sc> {
        &self.definitions
    }

    /// Sums the cached per-constraint scores.
    pub fn calculate_score(&mut self) -> Result<Sc> {
        let mut total = Sc::zero();
        for (constraint, score) in self.constraints.iter().zip(&self.scores) {
            total = total.checked_add(score).ok_or_else(|| {
                SolverError::ScoreOverflow(constraint.constraint_ref().full_name())
            })?;
        }
        self.solution.score = Some(total);
        Ok(total)
    }

    /// A deep copy of the working solution, score stamped.
    pub fn snapshot(&mut self) -> Result<Solution<Sc>> {
        let score = self.calculate_score()?;
        let mut copy = self.solution.clone();
        copy.score = Some(score);
        Ok(copy)
    }

    /// Sets one basic (non-list) variable.
    pub fn change_variable(
        &mut self,
        class: usize,
        entity: usize,
        field: usize,
        value: Value,
    ) -> Result<()> {
        let affected = self.affected_by_basic_change(class, entity);
        self.retract(&affected)?;
        self.solution.entities[class][entity].fields[field] = value;
        self.propagator
            .after_basic_change(&mut self.solution, class, entity);
        self.insert(&affected)?;
        self.finish_mutation()
    }

    /// Inserts an element reference into a list variable at `position`.
    pub fn list_insert(
        &mut self,
        owner_class: usize,
        owner_idx: usize,
        owner_field: usize,
        position: usize,
        element: Value,
    ) -> Result<()> {
        let element_ref = element.as_entity_ref().ok_or_else(|| {
            SolverError::InvalidState("list elements must be entity references".into())
        })?;
        let (mut affected, len) = self.affected_by_list(owner_class, owner_idx, owner_field)?;
        if position > len {
            return Err(SolverError::InvalidState(format!(
                "list insert position {position} past length {len}"
            )));
        }
        if !affected.contains(&element_ref) {
            affected.push(element_ref);
        }

        self.retract(&affected)?;
        self.solution.entities[owner_class][owner_idx].fields[owner_field]
            .as_list_mut()
            .ok_or_else(|| list_field_error(owner_class, owner_field))?
            .insert(position, element);
        self.propagator.after_list_change(
            &mut self.solution,
            owner_class,
            owner_idx,
            owner_field,
            position,
            position + 1,
        );
        self.insert(&affected)?;
        self.finish_mutation()
    }

    /// Removes the element at `position` from a list variable, returning it
    /// with its membership shadows cleared.
    pub fn list_remove(
        &mut self,
        owner_class: usize,
        owner_idx: usize,
        owner_field: usize,
        position: usize,
    ) -> Result<Value> {
        let (affected, len) = self.affected_by_list(owner_class, owner_idx, owner_field)?;
        if position >= len {
            return Err(SolverError::InvalidState(format!(
                "list remove position {position} past length {len}"
            )));
        }

        self.retract(&affected)?;
        let removed = self.solution.entities[owner_class][owner_idx].fields[owner_field]
            .as_list_mut()
            .ok_or_else(|| list_field_error(owner_class, owner_field))?
            .remove(position);
        if let Some((ec, ei)) = removed.as_entity_ref() {
            self.propagator
                .clear_element_shadows(&mut self.solution, ec, ei);
        }
        self.propagator.after_list_change(
            &mut self.solution,
            owner_class,
            owner_idx,
            owner_field,
            position,
            position,
        );
        self.insert(&affected)?;
        self.finish_mutation()?;
        Ok(removed)
    }

    /// Per-constraint analysis of the current solution. Deterministically
    /// ordered, so repeated calls on an unchanged solution are identical.
    pub fn explain(&self) -> Result<ScoreExplanation<Sc>> {
        let mut analyses = Vec::with_capacity(self.constraints.len());
        for (constraint, score) in self.constraints.iter().zip(&self.scores) {
            analyses.push(ConstraintAnalysis {
                constraint_ref: constraint.constraint_ref().clone(),
                score: *score,
                matches: constraint.collect_matches(&self.solution)?,
            });
        }
        ScoreExplanation::from_analyses(analyses)
    }

    /// Compares every cached incremental score against a from-scratch
    /// recomputation.
    pub fn assert_score_integrity(&self) -> Result<()> {
        for (constraint, cached) in self.constraints.iter().zip(&self.scores) {
            let recomputed = constraint.evaluate(&self.solution)?;
            if *cached != recomputed {
                return Err(SolverError::ScoreCorruption {
                    constraint: constraint.constraint_ref().full_name(),
                    incremental: cached.to_string(),
                    recomputed: recomputed.to_string(),
                });
            }
        }
        Ok(())
    }

    fn finish_mutation(&mut self) -> Result<()> {
        if self.mode == EnvironmentMode::FullAssert {
            self.assert_score_integrity()?;
        }
        Ok(())
    }

    fn retract(&mut self, affected: &[(usize, usize)]) -> Result<()> {
        for &(class, entity) in affected {
            for i in 0..self.by_class[class].len() {
                let pos = self.by_class[class][i];
                let delta = self.constraints[pos].on_retract(&self.solution, class, entity)?;
                self.apply_delta(pos, delta)?;
            }
        }
        Ok(())
    }

    fn insert(&mut self, affected: &[(usize, usize)]) -> Result<()> {
        for &(class, entity) in affected {
            for i in 0..self.by_class[class].len() {
                let pos = self.by_class[class][i];
                let delta = self.constraints[pos].on_insert(&self.solution, class, entity)?;
                self.apply_delta(pos, delta)?;
            }
        }
        Ok(())
    }

    fn apply_delta(&mut self, pos: usize, delta: Sc) -> Result<()> {
        self.scores[pos] = self.scores[pos].checked_add(&delta).ok_or_else(|| {
            SolverError::ScoreOverflow(self.constraints[pos].constraint_ref().full_name())
        })?;
        trace!(
            constraint = %self.constraints[pos].constraint_ref().full_name(),
            score = %self.scores[pos],
            "constraint score updated"
        );
        Ok(())
    }

    /// The conservative superset of entities whose fields or shadows a
    /// basic-variable change can touch: the entity itself, plus every
    /// element of its owning list when the change can restart a cascade.
    fn affected_by_basic_change(&self, class: usize, entity: usize) -> Vec<(usize, usize)> {
        let mut affected = vec![(class, entity)];
        for plan in self.solution.registry().list_plans() {
            if plan.element_class != class || plan.cascades.is_empty() {
                continue;
            }
            for owner in &self.solution.entities[plan.owner_class] {
                let Some(list) = owner.fields[plan.owner_field].as_list() else {
                    continue;
                };
                if !list
                    .iter()
                    .any(|v| v.as_entity_ref() == Some((class, entity)))
                {
                    continue;
                }
                for member in list.iter().filter_map(Value::as_entity_ref) {
                    if !affected.contains(&member) {
                        affected.push(member);
                    }
                }
            }
        }
        affected
    }

    /// The owner plus every element currently in its list, and the list's
    /// current length.
    fn affected_by_list(
        &self,
        owner_class: usize,
        owner_idx: usize,
        owner_field: usize,
    ) -> Result<(Vec<(usize, usize)>, usize)> {
        let list = self.solution.entities[owner_class][owner_idx].fields[owner_field]
            .as_list()
            .ok_or_else(|| list_field_error(owner_class, owner_field))?;
        let mut affected = vec![(owner_class, owner_idx)];
        for member in list.iter().filter_map(Value::as_entity_ref) {
            if !affected.contains(&member) {
                affected.push(member);
            }
        }
        Ok((affected, list.len()))
    }
}

fn list_field_error(owner_class: usize, owner_field: usize) -> SolverError {
    SolverError::InvalidState(format!(
        "field {owner_field} of class {owner_class} is not a list variable"
    ))
}

impl<Sc: Score> std::fmt::Debug for ScoreDirector<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreDirector")
            .field("constraints", &self.constraints.len())
            .field("mode", &self.mode)
            .finish()
    }
}
