//! Late acceptance acceptor.

use rand_chacha::ChaCha8Rng;

use lodestar_core::score::Score;

use crate::heuristic::r#move::MoveKey;

use super::Acceptor;

/// Accepts moves that beat the step score from `size` steps ago, kept in a
/// fixed ring buffer. Tolerates temporary worsening while the ring still
/// remembers older, worse scores.
#[derive(Debug, Clone)]
pub struct LateAcceptanceAcceptor<Sc: Score> {
    size: usize,
    history: Vec<Option<Sc>>,
    cursor: usize,
}

impl<Sc: Score> LateAcceptanceAcceptor<Sc> {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            history: vec![None; size],
            cursor: 0,
        }
    }
}

impl<Sc: Score> Default for LateAcceptanceAcceptor<Sc> {
    fn default() -> Self {
        Self::new(400)
    }
}

impl<Sc: Score> Acceptor<Sc> for LateAcceptanceAcceptor<Sc> {
    fn is_accepted(
        &mut self,
        _rng: &mut ChaCha8Rng,
        last_step_score: Sc,
        _best_score: Sc,
        move_score: Sc,
        _key: MoveKey,
    ) -> bool {
        if move_score > last_step_score {
            return true;
        }
        match self.history[self.cursor] {
            Some(late_score) => move_score >= late_score,
            None => true,
        }
    }

    fn phase_started(&mut self, initial_score: Sc) {
        for slot in &mut self.history {
            *slot = Some(initial_score);
        }
        self.cursor = 0;
    }

    fn step_ended(&mut self, step_score: Sc, _chosen: Option<MoveKey>) {
        self.history[self.cursor] = Some(step_score);
        self.cursor = (self.cursor + 1) % self.size;
    }
}
