//! Construction heuristic: greedy first fit, hardest placements first.

use tracing::debug;

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_core::Value;

use crate::scope::{PhaseScope, SolverScope, StepScope};
use crate::termination::Termination;

use super::Phase;

/// A basic-variable slot waiting for a value.
struct BasicPlacement {
    class: usize,
    entity: usize,
    field: usize,
    candidate_count: usize,
}

/// Fills every unassigned genuine variable once, without backtracking.
///
/// Placements are ordered fewest-candidates-first; for each one every
/// candidate value is scored through the incremental director and the best
/// is kept, earliest candidate winning ties. List elements are placed at
/// their best insertion position across all owners. The result may still be
/// infeasible; later phases improve it.
#[derive(Debug, Default)]
pub struct ConstructionHeuristicPhase;

impl ConstructionHeuristicPhase {
    pub fn new() -> Self {
        Self
    }

    fn basic_placements<Sc: Score>(scope: &SolverScope<Sc>) -> Vec<BasicPlacement> {
        let solution = scope.director().solution();
        let registry = solution.registry();
        let mut placements = Vec::new();
        for (class, def) in registry.entity_classes().iter().enumerate() {
            for (field, field_def) in def.fields.iter().enumerate() {
                if !field_def.is_genuine_variable() || field_def.is_list_variable() {
                    continue;
                }
                let candidate_count = registry
                    .resolve_value_range(class, field, solution)
                    .map_or(0, |candidates| candidates.len());
                for entity in 0..solution.entities[class].len() {
                    if solution.entities[class][entity].fields[field].is_none() {
                        placements.push(BasicPlacement {
                            class,
                            entity,
                            field,
                            candidate_count,
                        });
                    }
                }
            }
        }
        // Stable sort: declaration order breaks candidate-count ties.
        placements.sort_by_key(|p| p.candidate_count);
        placements
    }

    fn place_basic<Sc: Score>(
        scope: &mut PhaseScope<'_, Sc>,
        placement: &BasicPlacement,
    ) -> Result<()> {
        let candidates = {
            let solution = scope.director().solution();
            solution
                .registry()
                .resolve_value_range(placement.class, placement.field, solution)?
        };
        let mut best: Option<(Sc, Value)> = None;
        for candidate in candidates {
            scope.director_mut().change_variable(
                placement.class,
                placement.entity,
                placement.field,
                candidate.clone(),
            )?;
            let score = scope.calculate_score()?;
            // Strictly better only, so the earliest candidate wins ties.
            if best.as_ref().map_or(true, |(b, _)| score > *b) {
                best = Some((score, candidate));
            }
            scope.director_mut().change_variable(
                placement.class,
                placement.entity,
                placement.field,
                Value::None,
            )?;
        }
        if let Some((_, value)) = best {
            scope.director_mut().change_variable(
                placement.class,
                placement.entity,
                placement.field,
                value,
            )?;
        }
        Ok(())
    }

    /// Unassigned elements of one list variable, declaration order.
    fn unassigned_elements<Sc: Score>(
        scope: &SolverScope<Sc>,
        owner_class: usize,
        field: usize,
        element_class: usize,
    ) -> Vec<usize> {
        let solution = scope.director().solution();
        let mut assigned = vec![false; solution.entities[element_class].len()];
        for owner in &solution.entities[owner_class] {
            if let Some(list) = owner.fields[field].as_list() {
                for (class, idx) in list.iter().filter_map(Value::as_entity_ref) {
                    if class == element_class {
                        assigned[idx] = true;
                    }
                }
            }
        }
        (0..assigned.len()).filter(|&i| !assigned[i]).collect()
    }

    fn place_element<Sc: Score>(
        scope: &mut PhaseScope<'_, Sc>,
        owner_class: usize,
        field: usize,
        element: Value,
    ) -> Result<()> {
        let owner_count = scope.director().solution().entities[owner_class].len();
        let mut best: Option<(Sc, usize, usize)> = None;
        for owner in 0..owner_count {
            let len = scope.director().solution().entities[owner_class][owner].fields[field]
                .as_list()
                .map_or(0, <[_]>::len);
            for position in 0..=len {
                scope.director_mut().list_insert(
                    owner_class,
                    owner,
                    field,
                    position,
                    element.clone(),
                )?;
                let score = scope.calculate_score()?;
                if best.as_ref().map_or(true, |(b, _, _)| score > *b) {
                    best = Some((score, owner, position));
                }
                scope
                    .director_mut()
                    .list_remove(owner_class, owner, field, position)?;
            }
        }
        if let Some((_, owner, position)) = best {
            scope
                .director_mut()
                .list_insert(owner_class, owner, field, position, element)?;
        }
        Ok(())
    }
}

impl<Sc: Score> Phase<Sc> for ConstructionHeuristicPhase {
    fn name(&self) -> &str {
        "construction heuristic"
    }

    fn solve(
        &mut self,
        scope: &mut SolverScope<Sc>,
        termination: &dyn Termination<Sc>,
    ) -> Result<()> {
        let placements = Self::basic_placements(scope);
        let list_variables: Vec<(usize, usize, usize)> = scope
            .director()
            .solution()
            .registry()
            .list_plans()
            .iter()
            .map(|plan| (plan.owner_class, plan.owner_field, plan.element_class))
            .collect();

        let mut phase_scope = PhaseScope::new(scope, 0);
        debug!(
            placements = placements.len(),
            list_variables = list_variables.len(),
            "construction heuristic started"
        );

        for placement in &placements {
            if termination.is_terminated(phase_scope.solver_scope())
                || phase_scope.solver_scope().is_terminate_early()
            {
                break;
            }
            Self::place_basic(&mut phase_scope, placement)?;
            let mut step = StepScope::new(&mut phase_scope);
            step.complete();
            phase_scope.update_best_solution()?;
        }

        for (owner_class, field, element_class) in list_variables {
            for element in
                Self::unassigned_elements(phase_scope.solver_scope(), owner_class, field, element_class)
            {
                if termination.is_terminated(phase_scope.solver_scope())
                    || phase_scope.solver_scope().is_terminate_early()
                {
                    break;
                }
                Self::place_element(
                    &mut phase_scope,
                    owner_class,
                    field,
                    Value::Ref(element_class, element),
                )?;
                let mut step = StepScope::new(&mut phase_scope);
                step.complete();
                phase_scope.update_best_solution()?;
            }
        }

        let final_score = phase_scope.calculate_score()?;
        debug!(score = %final_score, steps = phase_scope.step_count(), "construction heuristic ended");
        Ok(())
    }
}
