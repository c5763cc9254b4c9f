//! Externally triggered termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lodestar_core::score::Score;

use crate::scope::SolverScope;

use super::Termination;

/// Terminates when a shared flag is raised from another thread.
#[derive(Debug, Clone, Default)]
pub struct ExternalTermination {
    flag: Arc<AtomicBool>,
}

impl ExternalTermination {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared flag. Store `true` to request termination.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl<Sc: Score> Termination<Sc> for ExternalTermination {
    fn is_terminated(&self, _scope: &SolverScope<Sc>) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
