//! Moves and move selectors.

pub mod r#move;
pub mod selector;

pub use r#move::{
    ChangeMove, ListChangeMove, ListSwapMove, Move, MoveKey, SwapMove, TwoOptMove,
};
pub use selector::{
    ChangeMoveSelector, ListChangeMoveSelector, ListSwapMoveSelector, MoveSelector,
    SwapMoveSelector, TwoOptMoveSelector, UnionMoveSelector,
};
