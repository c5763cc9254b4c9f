//! Local search: sample moves, accept, keep the best, repeat.

pub mod acceptor;

mod forager;
mod phase;

pub use acceptor::{
    Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor, SimulatedAnnealingAcceptor,
    TabuSearchAcceptor,
};
pub use forager::AcceptedCountForager;
pub use phase::LocalSearchPhase;
