//! Phase-level scope.

use std::time::Instant;

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::SolverScope;

/// Scope for a single phase of solving.
pub struct PhaseScope<'a, Sc: Score> {
    solver_scope: &'a mut SolverScope<Sc>,
    phase_index: usize,
    step_count: u64,
    start_time: Instant,
}

impl<'a, Sc: Score> PhaseScope<'a, Sc> {
    pub fn new(solver_scope: &'a mut SolverScope<Sc>, phase_index: usize) -> Self {
        Self {
            solver_scope,
            phase_index,
            step_count: 0,
            start_time: Instant::now(),
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.step_count += 1;
        self.solver_scope.increment_step_count();
        self.step_count
    }

    pub fn solver_scope(&self) -> &SolverScope<Sc> {
        self.solver_scope
    }

    pub fn solver_scope_mut(&mut self) -> &mut SolverScope<Sc> {
        self.solver_scope
    }

    pub fn director(&self) -> &ScoreDirector<Sc> {
        self.solver_scope.director()
    }

    pub fn director_mut(&mut self) -> &mut ScoreDirector<Sc> {
        self.solver_scope.director_mut()
    }

    pub fn calculate_score(&mut self) -> Result<Sc> {
        self.solver_scope.calculate_score()
    }

    pub fn update_best_solution(&mut self) -> Result<()> {
        self.solver_scope.update_best_solution()
    }
}
