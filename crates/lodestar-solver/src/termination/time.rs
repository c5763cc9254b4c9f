//! Wall-clock time limit.

use std::time::Duration;

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates once the solve has run for the given duration.
#[derive(Debug, Clone, Copy)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }
}

impl<Sc: Score> Termination<Sc> for TimeTermination {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        scope.elapsed() >= self.limit
    }
}
