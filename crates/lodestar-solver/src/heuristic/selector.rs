//! Random move selectors.
//!
//! Selectors draw one candidate move at a time from the rng. They do not
//! filter for doability; the local search phase checks `is_doable` before
//! evaluating.

use std::fmt::Debug;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use super::r#move::{
    ChangeMove, ListChangeMove, ListSwapMove, Move, SwapMove, TwoOptMove,
};

/// Draws random candidate moves.
pub trait MoveSelector<Sc: Score>: Send + Debug {
    /// One random candidate, or `None` when the solution offers nothing to
    /// select from.
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>>;
}

/// Random entity, random value from the variable's range.
#[derive(Debug, Clone)]
pub struct ChangeMoveSelector {
    class: usize,
    field: usize,
}

impl ChangeMoveSelector {
    pub fn new(class: usize, field: usize) -> Self {
        Self { class, field }
    }
}

impl<Sc: Score> MoveSelector<Sc> for ChangeMoveSelector {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        let solution = director.solution();
        let entity_count = solution.entities[self.class].len();
        if entity_count == 0 {
            return Ok(None);
        }
        let candidates = solution
            .registry()
            .resolve_value_range(self.class, self.field, solution)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let entity = rng.random_range(0..entity_count);
        let value = candidates[rng.random_range(0..candidates.len())].clone();
        Ok(Some(Box::new(ChangeMove::new(
            self.class, entity, self.field, value,
        ))))
    }
}

/// Two distinct random entities of one class.
#[derive(Debug, Clone)]
pub struct SwapMoveSelector {
    class: usize,
    field: usize,
}

impl SwapMoveSelector {
    pub fn new(class: usize, field: usize) -> Self {
        Self { class, field }
    }
}

impl<Sc: Score> MoveSelector<Sc> for SwapMoveSelector {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        let entity_count = director.solution().entities[self.class].len();
        if entity_count < 2 {
            return Ok(None);
        }
        let left = rng.random_range(0..entity_count);
        let mut right = rng.random_range(0..entity_count - 1);
        if right >= left {
            right += 1;
        }
        Ok(Some(Box::new(SwapMove::new(
            self.class, left, right, self.field,
        ))))
    }
}

fn list_len<Sc: Score>(
    director: &ScoreDirector<Sc>,
    class: usize,
    owner: usize,
    field: usize,
) -> usize {
    director.solution().entities[class][owner].fields[field]
        .as_list()
        .map_or(0, <[_]>::len)
}

/// Random occupied source position, random destination position.
#[derive(Debug, Clone)]
pub struct ListChangeMoveSelector {
    owner_class: usize,
    field: usize,
}

impl ListChangeMoveSelector {
    pub fn new(owner_class: usize, field: usize) -> Self {
        Self { owner_class, field }
    }
}

impl<Sc: Score> MoveSelector<Sc> for ListChangeMoveSelector {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        let owner_count = director.solution().entities[self.owner_class].len();
        if owner_count == 0 {
            return Ok(None);
        }
        let from_owner = rng.random_range(0..owner_count);
        let from_len = list_len(director, self.owner_class, from_owner, self.field);
        if from_len == 0 {
            return Ok(None);
        }
        let from_position = rng.random_range(0..from_len);
        let to_owner = rng.random_range(0..owner_count);
        let to_len = if to_owner == from_owner {
            from_len - 1
        } else {
            list_len(director, self.owner_class, to_owner, self.field)
        };
        let to_position = rng.random_range(0..=to_len);
        Ok(Some(Box::new(ListChangeMove::new(
            self.owner_class,
            self.field,
            from_owner,
            from_position,
            to_owner,
            to_position,
        ))))
    }
}

/// Two random occupied positions, possibly across owners.
#[derive(Debug, Clone)]
pub struct ListSwapMoveSelector {
    owner_class: usize,
    field: usize,
}

impl ListSwapMoveSelector {
    pub fn new(owner_class: usize, field: usize) -> Self {
        Self { owner_class, field }
    }

    fn random_position<Sc: Score>(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, usize)> {
        let owner_count = director.solution().entities[self.owner_class].len();
        if owner_count == 0 {
            return None;
        }
        let owner = rng.random_range(0..owner_count);
        let len = list_len(director, self.owner_class, owner, self.field);
        (len > 0).then(|| (owner, rng.random_range(0..len)))
    }
}

impl<Sc: Score> MoveSelector<Sc> for ListSwapMoveSelector {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        let Some((left_owner, left_position)) = self.random_position(director, rng) else {
            return Ok(None);
        };
        let Some((right_owner, right_position)) = self.random_position(director, rng) else {
            return Ok(None);
        };
        Ok(Some(Box::new(ListSwapMove::new(
            self.owner_class,
            self.field,
            left_owner,
            left_position,
            right_owner,
            right_position,
        ))))
    }
}

/// Random segment of a random owner's list.
#[derive(Debug, Clone)]
pub struct TwoOptMoveSelector {
    owner_class: usize,
    field: usize,
}

impl TwoOptMoveSelector {
    pub fn new(owner_class: usize, field: usize) -> Self {
        Self { owner_class, field }
    }
}

impl<Sc: Score> MoveSelector<Sc> for TwoOptMoveSelector {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        let owner_count = director.solution().entities[self.owner_class].len();
        if owner_count == 0 {
            return Ok(None);
        }
        let owner = rng.random_range(0..owner_count);
        let len = list_len(director, self.owner_class, owner, self.field);
        if len < 2 {
            return Ok(None);
        }
        let start = rng.random_range(0..len - 1);
        let end = rng.random_range(start + 2..=len);
        Ok(Some(Box::new(TwoOptMove::new(
            self.owner_class,
            owner,
            self.field,
            start,
            end,
        ))))
    }
}

/// Draws from one of several child selectors, uniformly at random.
#[derive(Debug)]
pub struct UnionMoveSelector<Sc: Score> {
    selectors: Vec<Box<dyn MoveSelector<Sc>>>,
}

impl<Sc: Score> UnionMoveSelector<Sc> {
    pub fn new(selectors: Vec<Box<dyn MoveSelector<Sc>>>) -> Self {
        Self { selectors }
    }
}

impl<Sc: Score> MoveSelector<Sc> for UnionMoveSelector<Sc> {
    fn next_move(
        &self,
        director: &ScoreDirector<Sc>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<Box<dyn Move<Sc>>>> {
        if self.selectors.is_empty() {
            return Ok(None);
        }
        // A child may come up empty (e.g. all lists empty); give the others
        // a chance before reporting exhaustion.
        for _ in 0..self.selectors.len() {
            let child = &self.selectors[rng.random_range(0..self.selectors.len())];
            if let Some(candidate) = child.next_move(director, rng)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
