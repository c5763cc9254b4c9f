//! Entry point of the fluent constraint API.

use std::sync::Arc;

use lodestar_core::domain::DomainRegistry;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;

use super::joiner::Joiner;
use super::{BiStream, UniStream};

/// Creates constraint streams against a frozen domain registry.
///
/// Class names are resolved here, so a typo fails when the constraint set
/// is defined instead of in the middle of a solve.
#[derive(Debug, Clone)]
pub struct ConstraintFactory<Sc: Score> {
    registry: Arc<DomainRegistry>,
    _score: std::marker::PhantomData<Sc>,
}

impl<Sc: Score> ConstraintFactory<Sc> {
    pub fn new(registry: Arc<DomainRegistry>) -> Self {
        Self {
            registry,
            _score: std::marker::PhantomData,
        }
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    pub(crate) fn resolve_class(&self, name: &str) -> Result<usize> {
        self.registry
            .entity_class_index(name)
            .ok_or_else(|| SolverError::DomainModel(format!("unknown entity class '{name}'")))
    }

    /// Stream over every entity of a class.
    pub fn for_each(&self, class: &str) -> Result<UniStream<Sc>> {
        Ok(UniStream::new(self.clone(), self.resolve_class(class)?))
    }

    /// Stream over unique pairs within a class: (earlier, later) by entity
    /// position, n(n-1)/2 candidates, joiners seeing the earlier entity as
    /// the left side.
    pub fn for_each_unique_pair(
        &self,
        class: &str,
        joiners: Vec<Joiner<Sc>>,
    ) -> Result<BiStream<Sc>> {
        let class = self.resolve_class(class)?;
        Ok(BiStream::new_unique_pair(class, joiners))
    }
}
