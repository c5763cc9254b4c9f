//! Swap move: exchanges one variable between two entities.

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::{key_of, Move, MoveKey};

/// Swaps the value of one basic variable between two entities of the same
/// class. Its own inverse.
#[derive(Debug, Clone)]
pub struct SwapMove {
    pub class: usize,
    pub left: usize,
    pub right: usize,
    pub field: usize,
}

impl SwapMove {
    pub fn new(class: usize, left: usize, right: usize, field: usize) -> Self {
        Self {
            class,
            left,
            right,
            field,
        }
    }
}

impl<Sc: Score> Move<Sc> for SwapMove {
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool {
        if self.left == self.right {
            return false;
        }
        let entities = &director.solution().entities[self.class];
        self.left < entities.len()
            && self.right < entities.len()
            && entities[self.left].fields[self.field] != entities[self.right].fields[self.field]
    }

    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        let entities = &director.solution().entities[self.class];
        let left_value = entities[self.left].fields[self.field].clone();
        let right_value = entities[self.right].fields[self.field].clone();
        director.change_variable(self.class, self.left, self.field, right_value)?;
        director.change_variable(self.class, self.right, self.field, left_value)?;
        Ok(Box::new(self.clone()))
    }


    fn tabu_key(&self) -> MoveKey {
        let (lo, hi) = if self.left <= self.right {
            (self.left, self.right)
        } else {
            (self.right, self.left)
        };
        key_of(("swap", self.class, lo, hi, self.field))
    }
}
