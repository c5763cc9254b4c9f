//! Scope hierarchy for solver execution.
//!
//! - [`SolverScope`]: owns the score director, best solution and rng
//! - [`PhaseScope`]: per-phase step count and timing
//! - [`StepScope`]: one step within a phase

mod phase;
mod solver;
mod step;

pub use phase::PhaseScope;
pub use solver::{BestSolutionCallback, SolverScope};
pub use step::StepScope;
