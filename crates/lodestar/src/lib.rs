//! Lodestar - A Constraint Solver in Rust
//!
//! Describe your domain at runtime, define constraints as streams, and
//! solve with configurable metaheuristics.
//!
//! # Example
//!
//! ```rust
//! use lodestar::prelude::*;
//!
//! // Score types are re-exported
//! let score = HardSoftScore::of(0, -100);
//! assert_eq!(score.hard(), 0);
//! assert_eq!(score.soft(), -100);
//! ```

// Score types
pub use lodestar_core::score::{
    HardMediumSoftScore, HardSoftScore, ParseableScore, Score, ScoreParseError, SimpleScore,
};

// Domain model
pub use lodestar_core::domain::{
    CascadeFn, DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType,
    ShadowKind, Solution, Value, ValueRangeDef,
};
pub use lodestar_core::error::{Result, SolverError};

// Constraint stream API
pub use lodestar_scoring::stream;
pub use lodestar_scoring::{
    Constraint, ConstraintSet, EnvironmentMode, ScoreDirector, ScoreExplanation,
};

// Solving
pub use lodestar_config::SolverConfig;
pub use lodestar_solver::{
    JobId, Solver, SolverJobManager, SolverStatus, Termination,
};

mod builder;
pub use builder::SolverBuilder;

pub mod prelude {
    pub use super::{
        DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType, Solution,
        Value, ValueRangeDef,
    };
    pub use super::{HardMediumSoftScore, HardSoftScore, Score, SimpleScore};
    pub use super::stream::{collector, joiner, ConstraintFactory};
    pub use super::{ConstraintSet, SolverBuilder, SolverConfig};
}

#[cfg(test)]
mod tests;
