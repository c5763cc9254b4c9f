//! Runtime-described domain model for planning problems.
//!
//! A problem is described by registering entity classes, fact classes and
//! value ranges in a [`DomainRegistry`]. The registry is a value owned by
//! the solver session (shared behind `Arc` once frozen), never a process
//! wide singleton, so concurrent solves can use different domain schemas.
//!
//! - [`Value`], [`Entity`], [`Fact`]: the dynamic data model
//! - [`Solution`]: all facts + all entities + a score
//! - [`DomainRegistry`]: descriptor registry, validated at `freeze()`
//! - [`ShadowPropagator`]: dependency-ordered recomputation of derived state

mod descriptor;
mod registry;
mod shadow;
mod solution;
mod value;

#[cfg(test)]
mod tests;

pub use descriptor::{
    CascadeFn, EntityClassDef, FactClassDef, FieldDef, FieldType, ShadowKind, ValueRangeDef,
};
pub use registry::{
    CascadePlan, ClassShadowPlan, DomainRegistry, ListShadowPlan, ResolvedValueRange,
};
pub use shadow::ShadowPropagator;
pub use solution::Solution;
pub use value::{Entity, Fact, Value};

/// Addresses a variable position: entity class index + field index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub class: usize,
    pub field: usize,
}

impl VariableRef {
    pub const fn new(class: usize, field: usize) -> Self {
        Self { class, field }
    }
}
