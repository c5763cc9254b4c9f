//! Step-level scope.

use lodestar_core::score::Score;

use super::PhaseScope;

/// Scope for a single step within a phase.
pub struct StepScope<'a, 'b, Sc: Score> {
    phase_scope: &'a mut PhaseScope<'b, Sc>,
    step_index: u64,
    step_score: Option<Sc>,
}

impl<'a, 'b, Sc: Score> StepScope<'a, 'b, Sc> {
    pub fn new(phase_scope: &'a mut PhaseScope<'b, Sc>) -> Self {
        let step_index = phase_scope.step_count();
        Self {
            phase_scope,
            step_index,
            step_score: None,
        }
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn step_score(&self) -> Option<Sc> {
        self.step_score
    }

    pub fn set_step_score(&mut self, score: Sc) {
        self.step_score = Some(score);
    }

    /// Marks this step as complete and increments counters.
    pub fn complete(&mut self) {
        self.phase_scope.increment_step_count();
    }

    pub fn phase_scope(&self) -> &PhaseScope<'b, Sc> {
        self.phase_scope
    }

    pub fn phase_scope_mut(&mut self) -> &mut PhaseScope<'b, Sc> {
        self.phase_scope
    }
}
