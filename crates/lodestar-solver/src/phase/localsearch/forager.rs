//! Forager: collects accepted moves within a step and picks one.

use lodestar_core::score::Score;

use crate::heuristic::r#move::Move;

/// Collects up to a limit of accepted moves per step and picks the best,
/// first-come winning ties.
pub struct AcceptedCountForager<Sc: Score> {
    accepted_count_limit: usize,
    accepted: Vec<(Box<dyn Move<Sc>>, Sc)>,
}

impl<Sc: Score> AcceptedCountForager<Sc> {
    pub fn new(accepted_count_limit: usize) -> Self {
        Self {
            accepted_count_limit: accepted_count_limit.max(1),
            accepted: Vec::new(),
        }
    }

    pub fn step_started(&mut self) {
        self.accepted.clear();
    }

    pub fn add_move(&mut self, candidate: Box<dyn Move<Sc>>, score: Sc) {
        self.accepted.push((candidate, score));
    }

    /// True once enough accepted moves are collected for this step.
    pub fn is_quit_early(&self) -> bool {
        self.accepted.len() >= self.accepted_count_limit
    }

    pub fn pick_move(&mut self) -> Option<(Box<dyn Move<Sc>>, Sc)> {
        let mut best: Option<usize> = None;
        for (i, (_, score)) in self.accepted.iter().enumerate() {
            if best.map_or(true, |b| *score > self.accepted[b].1) {
                best = Some(i);
            }
        }
        best.map(|i| self.accepted.swap_remove(i))
    }
}

impl<Sc: Score> std::fmt::Debug for AcceptedCountForager<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptedCountForager")
            .field("accepted_count_limit", &self.accepted_count_limit)
            .field("accepted", &self.accepted.len())
            .finish()
    }
}
