//! Target score limit.

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates once the best score reaches the target.
#[derive(Debug, Clone, Copy)]
pub struct BestScoreTermination<Sc: Score> {
    target: Sc,
}

impl<Sc: Score> BestScoreTermination<Sc> {
    pub fn new(target: Sc) -> Self {
        Self { target }
    }
}

impl<Sc: Score> Termination<Sc> for BestScoreTermination<Sc> {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        scope.best_score().is_some_and(|best| best >= self.target)
    }
}
