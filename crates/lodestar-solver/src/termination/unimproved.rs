//! Stagnation limit.

use std::time::Duration;

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates once the best solution has not improved for the given
/// duration.
#[derive(Debug, Clone, Copy)]
pub struct UnimprovedTimeTermination {
    limit: Duration,
}

impl UnimprovedTimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }
}

impl<Sc: Score> Termination<Sc> for UnimprovedTimeTermination {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        scope.time_since_improvement() >= self.limit
    }
}
