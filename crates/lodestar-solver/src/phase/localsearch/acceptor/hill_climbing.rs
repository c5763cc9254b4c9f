//! Hill climbing acceptor.

use rand_chacha::ChaCha8Rng;

use lodestar_core::score::Score;

use crate::heuristic::r#move::MoveKey;

use super::Acceptor;

/// Accepts only moves at least as good as the last step. Simple, fast,
/// and prone to getting stuck in local optima.
#[derive(Debug, Clone, Default)]
pub struct HillClimbingAcceptor;

impl HillClimbingAcceptor {
    pub fn new() -> Self {
        Self
    }
}

impl<Sc: Score> Acceptor<Sc> for HillClimbingAcceptor {
    fn is_accepted(
        &mut self,
        _rng: &mut ChaCha8Rng,
        last_step_score: Sc,
        _best_score: Sc,
        move_score: Sc,
        _key: MoveKey,
    ) -> bool {
        move_score >= last_step_score
    }
}
