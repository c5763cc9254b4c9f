//! Acceptors: strategies for escaping local optima.

mod hill_climbing;
mod late_acceptance;
mod simulated_annealing;
mod tabu_search;

use std::fmt::Debug;

use rand_chacha::ChaCha8Rng;

use lodestar_core::score::Score;

use crate::heuristic::r#move::MoveKey;

pub use hill_climbing::HillClimbingAcceptor;
pub use late_acceptance::LateAcceptanceAcceptor;
pub use simulated_annealing::SimulatedAnnealingAcceptor;
pub use tabu_search::TabuSearchAcceptor;

/// Decides, per candidate move, whether it may enter the forager.
pub trait Acceptor<Sc: Score>: Send + Debug {
    fn is_accepted(
        &mut self,
        rng: &mut ChaCha8Rng,
        last_step_score: Sc,
        best_score: Sc,
        move_score: Sc,
        key: MoveKey,
    ) -> bool;

    fn phase_started(&mut self, _initial_score: Sc) {}

    /// Called once per step with the chosen move, if any was applied.
    fn step_ended(&mut self, _step_score: Sc, _chosen: Option<MoveKey>) {}
}

#[cfg(test)]
mod tests;
