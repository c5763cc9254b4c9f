//! Error types for Lodestar

use thiserror::Error;

/// Main error type for Lodestar operations.
///
/// Registration errors (`DuplicateType`, `MissingValueRange`,
/// `CyclicShadowDependency`, `DuplicateConstraintName`) fail fast at setup,
/// before any solve starts. `ScoreCorruption` is fatal and aborts the active
/// solve. Infeasibility and cancellation are *not* errors: a solve may
/// legitimately return an infeasible best solution.
#[derive(Debug, Error)]
pub enum SolverError {
    /// An entity or fact class was registered twice under the same name.
    #[error("Duplicate type registration: '{0}'")]
    DuplicateType(String),

    /// A genuine planning variable has no registered value range.
    #[error("No value range '{range}' registered for variable '{class}.{variable}'")]
    MissingValueRange {
        class: String,
        variable: String,
        range: String,
    },

    /// The shadow-variable dependency graph contains a cycle.
    #[error("Cyclic shadow variable dependency involving '{class}.{variable}'")]
    CyclicShadowDependency { class: String, variable: String },

    /// Two constraints were registered under the same name.
    #[error("Duplicate constraint name: '{0}'")]
    DuplicateConstraintName(String),

    /// Incremental score diverged from a from-scratch recomputation.
    ///
    /// This is the single most safety-critical check in the engine: a
    /// corrupted incremental score makes the search silently converge on a
    /// worse-than-reported solution.
    #[error(
        "Score corruption in constraint '{constraint}': incremental {incremental} != recomputed {recomputed}"
    )]
    ScoreCorruption {
        constraint: String,
        incremental: String,
        recomputed: String,
    },

    /// Score arithmetic overflowed.
    #[error("Score overflow while accumulating constraint '{0}'")]
    ScoreOverflow(String),

    /// Error in solver configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error in domain model definition.
    #[error("Domain model error: {0}")]
    DomainModel(String),

    /// Invalid operation for current solver state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Lodestar operations
pub type Result<T> = std::result::Result<T, SolverError>;
