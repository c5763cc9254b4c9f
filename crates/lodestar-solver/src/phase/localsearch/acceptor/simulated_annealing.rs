//! Simulated annealing acceptor.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use lodestar_core::score::Score;

use crate::heuristic::r#move::MoveKey;

use super::Acceptor;

/// Accepts worsening moves with probability `exp(delta / temperature)`,
/// where `delta` is the (negative) scalarized score difference. The
/// temperature decays geometrically each step, so the acceptor degenerates
/// to greedy hill climbing as it approaches zero.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealingAcceptor {
    starting_temperature: f64,
    decay_rate: f64,
    current_temperature: f64,
}

impl SimulatedAnnealingAcceptor {
    pub fn new(starting_temperature: f64, decay_rate: f64) -> Self {
        Self {
            starting_temperature,
            decay_rate,
            current_temperature: starting_temperature,
        }
    }
}

impl Default for SimulatedAnnealingAcceptor {
    fn default() -> Self {
        Self::new(1.0, 0.99)
    }
}

impl<Sc: Score> Acceptor<Sc> for SimulatedAnnealingAcceptor {
    fn is_accepted(
        &mut self,
        rng: &mut ChaCha8Rng,
        last_step_score: Sc,
        _best_score: Sc,
        move_score: Sc,
        _key: MoveKey,
    ) -> bool {
        if move_score >= last_step_score {
            return true;
        }
        if self.current_temperature <= f64::EPSILON {
            return false;
        }
        let delta = move_score.to_scalar() - last_step_score.to_scalar();
        let probability = (delta / self.current_temperature).exp();
        probability.is_finite() && rng.random::<f64>() < probability
    }

    fn phase_started(&mut self, _initial_score: Sc) {
        self.current_temperature = self.starting_temperature;
    }

    fn step_ended(&mut self, _step_score: Sc, _chosen: Option<MoveKey>) {
        self.current_temperature *= self.decay_rate;
    }
}
