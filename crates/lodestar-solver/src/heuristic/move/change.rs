//! Change move: assigns one basic variable.

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_core::Value;
use lodestar_scoring::ScoreDirector;

use super::{key_of, Move, MoveKey};

/// Sets a basic planning variable of one entity to a new value.
#[derive(Debug, Clone)]
pub struct ChangeMove {
    pub class: usize,
    pub entity: usize,
    pub field: usize,
    pub value: Value,
}

impl ChangeMove {
    pub fn new(class: usize, entity: usize, field: usize, value: Value) -> Self {
        Self {
            class,
            entity,
            field,
            value,
        }
    }
}

impl<Sc: Score> Move<Sc> for ChangeMove {
    fn is_doable(&self, director: &ScoreDirector<Sc>) -> bool {
        let entities = &director.solution().entities[self.class];
        self.entity < entities.len() && entities[self.entity].fields[self.field] != self.value
    }

    fn apply(&self, director: &mut ScoreDirector<Sc>) -> Result<Box<dyn Move<Sc>>> {
        let old = director.solution().entities[self.class][self.entity].fields[self.field].clone();
        director.change_variable(self.class, self.entity, self.field, self.value.clone())?;
        Ok(Box::new(ChangeMove::new(
            self.class,
            self.entity,
            self.field,
            old,
        )))
    }


    fn tabu_key(&self) -> MoveKey {
        // Keyed on the reassigned slot, not the target value, so the
        // inverse of a recent change stays tabu too.
        key_of(("change", self.class, self.entity, self.field))
    }
}
