//! SimpleScore - Single-level score for problems without hard constraints

use std::cmp::Ordering;
use std::fmt;

use super::traits::Score;
use super::ScoreLevel;

/// A score with a single level.
///
/// Useful for problems where every constraint has the same priority, or for
/// tests. A `SimpleScore` is always feasible: there is no hard level.
///
/// # Examples
///
/// ```
/// use lodestar_core::SimpleScore;
///
/// let a = SimpleScore::of(-10);
/// let b = SimpleScore::of(-3);
/// assert!(b > a);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleScore {
    value: i64,
}

impl SimpleScore {
    /// The zero score.
    pub const ZERO: SimpleScore = SimpleScore { value: 0 };

    /// One unit.
    pub const ONE: SimpleScore = SimpleScore { value: 1 };

    /// Creates a new SimpleScore.
    #[inline]
    pub const fn of(value: i64) -> Self {
        SimpleScore { value }
    }

    /// Returns the score value.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

impl Score for SimpleScore {
    #[inline]
    fn is_feasible(&self) -> bool {
        true
    }

    #[inline]
    fn zero() -> Self {
        SimpleScore::ZERO
    }

    #[inline]
    fn levels_count() -> usize {
        1
    }

    fn to_level_numbers(&self) -> Vec<i64> {
        vec![self.value]
    }

    fn from_level_numbers(levels: &[i64]) -> Self {
        assert_eq!(levels.len(), 1, "SimpleScore requires exactly 1 level");
        SimpleScore::of(levels[0])
    }

    impl_score_arith!(SimpleScore { value } => of);

    fn level_label(index: usize) -> ScoreLevel {
        match index {
            0 => ScoreLevel::Soft,
            _ => panic!("SimpleScore has 1 level, got index {}", index),
        }
    }

    #[inline]
    fn to_scalar(&self) -> f64 {
        self.value as f64
    }
}

impl Ord for SimpleScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl_score_ops!(SimpleScore { value } => of);

impl fmt::Debug for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleScore({})", self.value)
    }
}

impl fmt::Display for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl crate::score::traits::ParseableScore for SimpleScore {
    fn parse(s: &str) -> Result<Self, crate::score::traits::ScoreParseError> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| crate::score::traits::ScoreParseError {
                message: format!("Invalid SimpleScore '{}': {}", s, e),
            })?;
        Ok(SimpleScore::of(value))
    }

    fn to_string_repr(&self) -> String {
        self.value.to_string()
    }
}
