//! Termination conditions, checked once per step.

mod best_score;
mod composite;
mod external;
mod step_count;
mod time;
mod unimproved;

use std::fmt::Debug;

use lodestar_core::score::Score;

use crate::scope::SolverScope;

pub use best_score::BestScoreTermination;
pub use composite::{AndTermination, OrTermination};
pub use external::ExternalTermination;
pub use step_count::StepCountTermination;
pub use time::TimeTermination;
pub use unimproved::UnimprovedTimeTermination;

/// Decides when solving stops.
///
/// Implementations must be cheap; the solver consults them between steps,
/// so the latency of `terminate_early` is bounded by one step.
pub trait Termination<Sc: Score>: Send + Sync + Debug {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool;
}

/// Never terminates on its own; the solver still honors `terminate_early`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTermination;

impl<Sc: Score> Termination<Sc> for NeverTermination {
    fn is_terminated(&self, _scope: &SolverScope<Sc>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests;
