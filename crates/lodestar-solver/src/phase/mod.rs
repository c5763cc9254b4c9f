//! Solver phases.

pub mod construction;
pub mod localsearch;

use lodestar_core::error::Result;
use lodestar_core::score::Score;

use crate::scope::SolverScope;
use crate::termination::Termination;

pub use construction::ConstructionHeuristicPhase;
pub use localsearch::LocalSearchPhase;

/// One stage of the solving pipeline, run to completion in order.
pub trait Phase<Sc: Score>: Send {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        scope: &mut SolverScope<Sc>,
        termination: &dyn Termination<Sc>,
    ) -> Result<()>;
}
