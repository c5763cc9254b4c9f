//! Lodestar Solver - Metaheuristic search
//!
//! This crate turns a score director into solutions:
//! - Reversible moves and random move selectors
//! - A greedy construction heuristic for the initial solution
//! - Local search with pluggable acceptors (hill climbing, tabu search,
//!   simulated annealing, late acceptance)
//! - Termination conditions and a background job manager

pub mod heuristic;
pub mod manager;
pub mod phase;
pub mod scope;
pub mod solver;
pub mod termination;

pub use heuristic::r#move::{
    ChangeMove, ListChangeMove, ListSwapMove, Move, MoveKey, SwapMove, TwoOptMove,
};
pub use heuristic::selector::{
    ChangeMoveSelector, ListChangeMoveSelector, ListSwapMoveSelector, MoveSelector,
    SwapMoveSelector, TwoOptMoveSelector, UnionMoveSelector,
};
pub use manager::{JobId, SolverJobManager, SolverStatus};
pub use phase::localsearch::{
    Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor, LocalSearchPhase,
    SimulatedAnnealingAcceptor, TabuSearchAcceptor,
};
pub use phase::{ConstructionHeuristicPhase, Phase};
pub use scope::{BestSolutionCallback, PhaseScope, SolverScope, StepScope};
pub use solver::Solver;
pub use termination::{
    AndTermination, BestScoreTermination, ExternalTermination, NeverTermination, OrTermination,
    StepCountTermination, Termination, TimeTermination, UnimprovedTimeTermination,
};

#[cfg(test)]
pub(crate) mod test_util;
