//! List change move: relocates one list element.

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::{key_of, Move, MoveKey};

/// Removes the element at `from_position` of one owner's list and inserts
/// it at `to_position` of another (or the same) owner's list.
///
/// `to_position` indexes the destination list *after* the removal, so a
/// same-owner move past the source position needs no adjustment.
#[derive(Debug, Clone)]
pub struct ListChangeMove {
    pub owner_class: usize,
    pub field: usize,
    pub from_owner: usize,
    pub from_position: usize,
    pub to_owner: usize,
    pub to_position: usize,
}

impl ListChangeMove {
    pub fn new(
        owner_class: usize,
        field: usize,
        from_owner: usize,
        from_position: usize,
        to_owner: usize,
        to_position: usize,
    ) -> Self {
        Self {
            owner_class,
            field,
            from_owner,
            from_position,
            to_owner,
            to_position,
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

impl<Sc: Score> Move<Sc> for ListChangeMove {
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool {
        let Some(from_len) = self.list_len(director, self.from_owner) else {
            return false;
        };
        let Some(to_len) = self.list_len(director, self.to_owner) else {
            return false;
        };
        if self.from_position >= from_len {
            return false;
        }
        let to_len = if self.from_owner == self.to_owner {
            to_len - 1
        } else {
            to_len
        };
        if self.to_position > to_len {
            return false;
        }
        // Putting the element back where it came from is a no-op.
        !(self.from_owner == self.to_owner && self.from_position == self.to_position)
    }

    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        let element =
            director.list_remove(self.owner_class, self.from_owner, self.field, self.from_position)?;
        director.list_insert(
            self.owner_class,
            self.to_owner,
            self.field,
            self.to_position,
            element,
        )?;
        Ok(Box::new(ListChangeMove::new(
            self.owner_class,
            self.field,
            self.to_owner,
            self.to_position,
            self.from_owner,
            self.from_position,
        )))
    }


    fn tabu_key(&self) -> MoveKey {
        key_of((
            "list_change",
            self.owner_class,
            self.field,
            self.from_owner,
            self.from_position,
            self.to_owner,
            self.to_position,
        ))
    }
}
