//! Score types for representing solution quality.
//!
//! A score is a fixed-arity tuple of signed integer levels compared
//! lexicographically: level 0 dominates level 1, and so on. Feasibility
//! means every level except the last is >= 0.

#[macro_use]
mod macros;

mod hard_medium_soft;
mod hard_soft;
mod level;
mod simple;
mod traits;


pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use level::ScoreLevel;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};
