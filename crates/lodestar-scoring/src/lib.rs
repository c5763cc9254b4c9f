//! Lodestar Scoring - Incremental constraint-stream scoring
//!
//! Constraints are defined as streams: start from every entity of a class,
//! narrow, join, aggregate, then attach a penalty or reward. Definitions
//! compile into incremental constraints whose indexes are maintained delta
//! by delta, so scoring a move costs proportional to what the move touched
//! rather than to the whole solution.
//!
//! The [`ScoreDirector`] owns a working solution and is the single mutation
//! entry point: it brackets every change with retract/insert calls on the
//! affected constraints and triggers shadow propagation in between.

pub mod analysis;
pub mod constraint;
pub mod director;
pub mod set;
pub mod stream;

pub use analysis::{
    ConstraintAnalysis, ConstraintMatch, EntityRef, Indictment, ScoreExplanation,
};
pub use constraint::{Constraint, IncrementalConstraint};
pub use director::{EnvironmentMode, ScoreDirector};
pub use set::ConstraintSet;
pub use stream::{BiStream, ConstraintFactory, GroupedStream, UniStream};

#[cfg(test)]
mod tests;
