//! A validated, named set of constraint definitions.

use std::collections::HashSet;
use std::sync::Arc;

use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;

use crate::constraint::Constraint;

/// The complete constraint set of one problem definition.
///
/// Built once, validated eagerly, then shared read-only across score
/// directors and solver jobs.
#[derive(Debug, Clone)]
pub struct ConstraintSet<Sc: Score> {
    constraints: Arc<[Constraint<Sc>]>,
}

impl<Sc: Score> ConstraintSet<Sc> {
    /// Validates the definitions and seals them into a set.
    ///
    /// Fails with [`SolverError::DuplicateConstraintName`] when two
    /// constraints share a full name, so misconfiguration surfaces at
    /// build time instead of corrupting analysis output later.
    pub fn build(constraints: Vec<Constraint<Sc>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for constraint in &constraints {
            let full_name = constraint.constraint_ref().full_name();
            if !seen.insert(full_name.clone()) {
                return Err(SolverError::DuplicateConstraintName(full_name));
            }
        }
        Ok(Self {
            constraints: constraints.into(),
        })
    }

    pub fn constraints(&self) -> &[Constraint<Sc>] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}
