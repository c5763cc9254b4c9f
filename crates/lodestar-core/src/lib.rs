//! Lodestar Core - Core types for constraint solving
//!
//! This crate provides the fundamental abstractions for Lodestar:
//! - Score types for representing solution quality
//! - A runtime-described domain model (entities, facts, planning variables)
//! - The descriptor registry that validates domain schemas at setup time
//! - Shadow-variable propagation for derived state

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{
    DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType,
    ShadowKind, Solution, Value, ValueRangeDef, VariableRef,
};
pub use error::{Result, SolverError};
pub use score::{
    HardMediumSoftScore, HardSoftScore, ParseableScore, Score, ScoreParseError, SimpleScore,
};
