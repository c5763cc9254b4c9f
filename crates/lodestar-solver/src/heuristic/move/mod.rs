//! Move types: reversible mutations of the working solution.
//!
//! Every move routes its mutation through the score director's hooks, so
//! shadow variables and incremental constraint state stay consistent.
//! `apply` returns the inverse move; local search applies a candidate,
//! scores it, then applies the inverse to restore the previous state.

mod change;
mod list_change;
mod list_swap;
mod swap;
mod two_opt;

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

pub use change::ChangeMove;
pub use list_change::ListChangeMove;
pub use list_swap::ListSwapMove;
pub use swap::SwapMove;
pub use two_opt::TwoOptMove;

/// Hash identity of a move, used for tabu bookkeeping.
pub type MoveKey = u64;

pub(crate) fn key_of(parts: impl Hash) -> MoveKey {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

/// A reversible mutation.
pub trait Move<Sc: Score>: Send + Debug {
    /// Whether the move is valid and non-trivial on the current solution.
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool;

    /// Applies the move, returning its inverse.
    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>>;

    /// Tabu identity of this move.
    fn tabu_key(&self) -> MoveKey;
}
