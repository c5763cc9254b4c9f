//! Step count limit.

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates after a fixed number of steps across all phases.
#[derive(Debug, Clone, Copy)]
pub struct StepCountTermination {
    limit: u64,
}

impl StepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl<Sc: Score> Termination<Sc> for StepCountTermination {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        scope.total_step_count() >= self.limit
    }
}
