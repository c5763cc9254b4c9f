//! Tabu search acceptor.

use std::collections::{HashSet, VecDeque};

use rand_chacha::ChaCha8Rng;

use lodestar_core::score::Score;

use crate::heuristic::r#move::MoveKey;

use super::Acceptor;

/// Rejects moves whose key was chosen within the last `tabu_size` steps,
/// unless the move would beat the best score seen so far (aspiration).
#[derive(Debug, Clone)]
pub struct TabuSearchAcceptor {
    tabu_size: usize,
    recency: VecDeque<MoveKey>,
    tabu: HashSet<MoveKey>,
}

impl TabuSearchAcceptor {
    pub fn new(tabu_size: usize) -> Self {
        Self {
            tabu_size: tabu_size.max(1),
            recency: VecDeque::new(),
            tabu: HashSet::new(),
        }
    }
}

impl Default for TabuSearchAcceptor {
    fn default() -> Self {
        Self::new(7)
    }
}

impl<Sc: Score> Acceptor<Sc> for TabuSearchAcceptor {
    fn is_accepted(
        &mut self,
        _rng: &mut ChaCha8Rng,
        _last_step_score: Sc,
        best_score: Sc,
        move_score: Sc,
        key: MoveKey,
    ) -> bool {
        if !self.tabu.contains(&key) {
            return true;
        }
        // Aspiration: a tabu move that improves on the global best is
        // clearly not a cycle.
        move_score > best_score
    }

    fn phase_started(&mut self, _initial_score: Sc) {
        self.recency.clear();
        self.tabu.clear();
    }

    fn step_ended(&mut self, _step_score: Sc, chosen: Option<MoveKey>) {
        let Some(key) = chosen else {
            return;
        };
        self.recency.push_back(key);
        self.tabu.insert(key);
        while self.recency.len() > self.tabu_size {
            if let Some(expired) = self.recency.pop_front() {
                // Only drop from the set if no younger entry shares the key.
                if !self.recency.contains(&expired) {
                    self.tabu.remove(&expired);
                }
            }
        }
    }
}
