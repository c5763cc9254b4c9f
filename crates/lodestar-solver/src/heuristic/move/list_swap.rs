//! List swap move: exchanges two list elements.

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::{key_of, Move, MoveKey};

/// Swaps the elements at two list positions, possibly across owners. Its
/// own inverse.
#[derive(Debug, Clone)]
pub struct ListSwapMove {
    pub owner_class: usize,
    pub field: usize,
    pub left_owner: usize,
    pub left_position: usize,
    pub right_owner: usize,
    pub right_position: usize,
}

impl ListSwapMove {
    pub fn new(
        owner_class: usize,
        field: usize,
        left_owner: usize,
        left_position: usize,
        right_owner: usize,
        right_position: usize,
    ) -> Self {
        Self {
            owner_class,
            field,
            left_owner,
            left_position,
            right_owner,
            right_position,
        }
    }

    fn list_len<Sc: Score>(&self, director: &ScoreDirector<Sc>, owner: usize) -> Option<usize> {
        director.solution().entities[self.owner_class]
            .get(owner)?
            .fields[self.field]
            .as_list()
            .map(<[_]>::len)
    }
}

impl<Sc: Score> Move<Sc> for ListSwapMove {
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool {
        if self.left_owner == self.right_owner && self.left_position == self.right_position {
            return false;
        }
        matches!(
            (
                self.list_len(director, self.left_owner),
                self.list_len(director, self.right_owner),
            ),
            (Some(left_len), Some(right_len))
                if self.left_position < left_len && self.right_position < right_len
        )
    }

    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        if self.left_owner == self.right_owner {
            // Remove the higher position first so the lower stays valid.
            let (lo, hi) = if self.left_position < self.right_position {
                (self.left_position, self.right_position)
            } else {
                (self.right_position, self.left_position)
            };
            let owner = self.left_owner;
            let hi_element = director.list_remove(self.owner_class, owner, self.field, hi)?;
            let lo_element = director.list_remove(self.owner_class, owner, self.field, lo)?;
            director.list_insert(self.owner_class, owner, self.field, lo, hi_element)?;
            director.list_insert(self.owner_class, owner, self.field, hi, lo_element)?;
        } else {
            let left = director.list_remove(
                self.owner_class,
                self.left_owner,
                self.field,
                self.left_position,
            )?;
            let right = director.list_remove(
                self.owner_class,
                self.right_owner,
                self.field,
                self.right_position,
            )?;
            director.list_insert(
                self.owner_class,
                self.left_owner,
                self.field,
                self.left_position,
                right,
            )?;
            director.list_insert(
                self.owner_class,
                self.right_owner,
                self.field,
                self.right_position,
                left,
            )?;
        }
        Ok(Box::new(self.clone()))
    }


    fn tabu_key(&self) -> MoveKey {
        let (a, b) = if (self.left_owner, self.left_position) <= (self.right_owner, self.right_position)
        {
            (
                (self.left_owner, self.left_position),
                (self.right_owner, self.right_position),
            )
        } else {
            (
                (self.right_owner, self.right_position),
                (self.left_owner, self.left_position),
            )
        };
        key_of(("list_swap", self.owner_class, self.field, a, b))
    }
}
