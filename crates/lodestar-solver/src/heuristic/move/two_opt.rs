//! Two-opt move: reverses a list segment.

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::{key_of, Move, MoveKey};

/// Reverses the segment `[start, end)` of one owner's list, the classic
/// edge-uncrossing move for routing problems. Its own inverse.
#[derive(Debug, Clone)]
pub struct TwoOptMove {
    pub owner_class: usize,
    pub owner: usize,
    pub field: usize,
    pub start: usize,
    pub end: usize,
}

impl TwoOptMove {
    pub fn new(owner_class: usize, owner: usize, field: usize, start: usize, end: usize) -> Self {
        Self {
            owner_class,
            owner,
            field,
            start,
            end,
        }
    }
}

impl<Sc: Score> Move<Sc> for TwoOptMove {
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool {
        if self.end <= self.start + 1 {
            return false;
        }
        director.solution().entities[self.owner_class]
            .get(self.owner)
            .and_then(|owner| owner.fields[self.field].as_list())
            .is_some_and(|list| self.end <= list.len())
    }

    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        // Walking each element to the front of the segment reverses it.
        for offset in 1..(self.end - self.start) {
            let element = director.list_remove(
                self.owner_class,
                self.owner,
                self.field,
                self.start + offset,
            )?;
            director.list_insert(self.owner_class, self.owner, self.field, self.start, element)?;
        }
        Ok(Box::new(self.clone()))
    }


    fn tabu_key(&self) -> MoveKey {
        key_of((
            "two_opt",
            self.owner_class,
            self.owner,
            self.field,
            self.start,
            self.end,
        ))
    }
}
