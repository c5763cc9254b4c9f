//! Boolean combinations of terminations.

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates only when every child termination agrees.
#[derive(Debug)]
pub struct AndTermination<Sc: Score> {
    terminations: Vec<Box<dyn Termination<Sc>>>,
}

impl<Sc: Score> AndTermination<Sc> {
    pub fn new(terminations: Vec<Box<dyn Termination<Sc>>>) -> Self {
        Self { terminations }
    }
}

impl<Sc: Score> Termination<Sc> for AndTermination<Sc> {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        !self.terminations.is_empty() && self.terminations.iter().all(|t| t.is_terminated(scope))
    }
}

/// Terminates as soon as any child termination fires.
#[derive(Debug)]
pub struct OrTermination<Sc: Score> {
    terminations: Vec<Box<dyn Termination<Sc>>>,
}

impl<Sc: Score> OrTermination<Sc> {
    pub fn new(terminations: Vec<Box<dyn Termination<Sc>>>) -> Self {
        Self { terminations }
    }
}

impl<Sc: Score> Termination<Sc> for OrTermination<Sc> {
    fn is_terminated(&self, scope: &SolverScope<Sc>) -> bool {
        self.terminations.iter().any(|t| t.is_terminated(scope))
    }
}
