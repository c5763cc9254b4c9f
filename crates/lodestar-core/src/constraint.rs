//! Core constraint identification types.

/// Reference to a constraint for identification.
///
/// # Example
///
/// ```
/// use lodestar_core::ConstraintRef;
///
/// let cr = ConstraintRef::new("scheduling", "NoOverlap");
/// assert_eq!(cr.full_name(), "scheduling/NoOverlap");
///
/// let simple = ConstraintRef::new("", "Simple");
/// assert_eq!(simple.full_name(), "Simple");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintRef {
    /// Package/module containing the constraint.
    pub package: String,
    /// Name of the constraint, unique within its set.
    pub name: String,
}

impl ConstraintRef {
    /// Creates a new constraint reference.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Returns the fully qualified name.
    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.package, self.name)
        }
    }
}

/// Type of impact a constraint has on the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactType {
    /// Penalize (subtract from score).
    Penalty,
    /// Reward (add to score).
    Reward,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_ref_full_name() {
        let cr = ConstraintRef::new("demo", "RoomConflict");
        assert_eq!(cr.full_name(), "demo/RoomConflict");
    }

    #[test]
    fn constraint_ref_empty_package() {
        let cr = ConstraintRef::new("", "RoomConflict");
        assert_eq!(cr.full_name(), "RoomConflict");
    }
}
