//! Local search phase implementation.

use tracing::{debug, trace};

use lodestar_core::error::Result;
use lodestar_core::score::Score;

use crate::heuristic::selector::MoveSelector;
use crate::phase::Phase;
use crate::scope::{PhaseScope, SolverScope, StepScope};
use crate::termination::Termination;

use super::{AcceptedCountForager, Acceptor};

/// Iteratively improves an initialized solution.
///
/// Per step: sample candidate moves, speculatively apply each one, score
/// it, undo it, and ask the acceptor whether it may enter the forager. The
/// forager's pick is then re-applied for real. A step with no accepted
/// move ends the phase (the acceptor has nowhere left to go).
pub struct LocalSearchPhase<Sc: Score> {
    selector: Box<dyn MoveSelector<Sc>>,
    acceptor: Box<dyn Acceptor<Sc>>,
    forager: AcceptedCountForager<Sc>,
    /// Candidates sampled per step, accepted or not.
    selected_count_limit: usize,
}

impl<Sc: Score> LocalSearchPhase<Sc> {
    pub fn new(
        selector: Box<dyn MoveSelector<Sc>>,
        acceptor: Box<dyn Acceptor<Sc>>,
        accepted_count_limit: usize,
        selected_count_limit: usize,
    ) -> Self {
        Self {
            selector,
            acceptor,
            forager: AcceptedCountForager::new(accepted_count_limit),
            selected_count_limit: selected_count_limit.max(1),
        }
    }
}

impl<Sc: Score> Phase<Sc> for LocalSearchPhase<Sc> {
    fn name(&self) -> &str {
        "local search"
    }

    fn solve(
        &mut self,
        scope: &mut SolverScope<Sc>,
        termination: &dyn Termination<Sc>,
    ) -> Result<()> {
        let mut phase_scope = PhaseScope::new(scope, 1);
        let mut last_step_score = phase_scope.calculate_score()?;
        debug!(score = %last_step_score, "local search started");
        self.acceptor.phase_started(last_step_score);

        loop {
            if termination.is_terminated(phase_scope.solver_scope())
                || phase_scope.solver_scope().is_terminate_early()
            {
                break;
            }

            self.forager.step_started();
            let best_score = phase_scope
                .solver_scope()
                .best_score()
                .unwrap_or(last_step_score);

            let mut selected = 0;
            while selected < self.selected_count_limit && !self.forager.is_quit_early() {
                let candidate = {
                    let (director, rng) = phase_scope.solver_scope_mut().director_and_rng();
                    self.selector.next_move(director, rng)?
                };
                let Some(candidate) = candidate else {
                    break;
                };
                selected += 1;
                if !candidate.is_doable(phase_scope.director()) {
                    continue;
                }

                let undo = candidate.apply(phase_scope.director_mut())?;
                let move_score = phase_scope.calculate_score()?;
                undo.apply(phase_scope.director_mut())?;

                let accepted = self.acceptor.is_accepted(
                    phase_scope.solver_scope_mut().rng(),
                    last_step_score,
                    best_score,
                    move_score,
                    candidate.tabu_key(),
                );
                if accepted {
                    self.forager.add_move(candidate, move_score);
                }
            }

            let Some((chosen, chosen_score)) = self.forager.pick_move() else {
                debug!("no accepted move left, ending local search");
                break;
            };
            trace!(step = phase_scope.step_count(), score = %chosen_score, chosen = ?chosen, "step");
            chosen.apply(phase_scope.director_mut())?;

            let mut step = StepScope::new(&mut phase_scope);
            step.set_step_score(chosen_score);
            step.complete();

            last_step_score = chosen_score;
            self.acceptor.step_ended(chosen_score, Some(chosen.tabu_key()));
            phase_scope.update_best_solution()?;
        }

        debug!(
            steps = phase_scope.step_count(),
            best = ?phase_scope.solver_scope().best_score(),
            "local search ended"
        );
        Ok(())
    }
}

impl<Sc: Score> std::fmt::Debug for LocalSearchPhase<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSearchPhase")
            .field("acceptor", &self.acceptor)
            .field("forager", &self.forager)
            .field("selected_count_limit", &self.selected_count_limit)
            .finish()
    }
}
