//! Semantic labels for score levels.

/// Semantic label of a single score level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Must be satisfied for feasibility.
    Hard,
    /// Dominates soft, dominated by hard.
    Medium,
    /// Optimization objective.
    Soft,
}
