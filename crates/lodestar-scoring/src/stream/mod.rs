//! The constraint stream builder API.
//!
//! A stream starts at [`ConstraintFactory::for_each`] over one entity
//! class, is narrowed by `filter`, widened by `join`/`for_each_unique_pair`,
//! conditioned by `if_exists`/`if_not_exists`, aggregated by `group_by`,
//! and terminated by `penalize`/`reward`/`impact` plus `as_constraint`.
//! The result is a [`Constraint`](crate::constraint::Constraint) definition
//! that compiles to incremental state per score director.
//!
//! All closures receive the solution plus entity positions, because the
//! domain model is runtime-described; `Arc` closures keep stream values
//! cheap to clone and share across solver sessions.

pub mod collector;
pub mod joiner;

mod bi;
mod factory;
mod grouped;
mod uni;

pub use bi::BiStream;
pub use factory::ConstraintFactory;
pub use grouped::GroupedStream;
pub use uni::{ExistsStream, MappedStream, UniStream};

use std::sync::Arc;

use lodestar_core::domain::Solution;
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType, Value};

use crate::constraint::{Constraint, ConstraintKind};

use self::collector::Aggregate;

/// Predicate over one entity of a stream's class.
pub type UniPredicate<Sc> = Arc<dyn Fn(&Solution<Sc>, usize) -> bool + Send + Sync>;
/// Key extraction for joiners, group keys and map.
pub type UniKeyFn<Sc> = Arc<dyn Fn(&Solution<Sc>, usize) -> Value + Send + Sync>;
/// Match weight for uni terminals.
pub type UniWeightFn<Sc> = Arc<dyn Fn(&Solution<Sc>, usize) -> Sc + Send + Sync>;
/// Integer metric (sums, loads).
pub type MetricFn<Sc> = Arc<dyn Fn(&Solution<Sc>, usize) -> i64 + Send + Sync>;
/// Predicate over a candidate pair (left entity, right entity).
pub type PairPredicate<Sc> = Arc<dyn Fn(&Solution<Sc>, usize, usize) -> bool + Send + Sync>;
/// Match weight for pair terminals.
pub type PairWeightFn<Sc> = Arc<dyn Fn(&Solution<Sc>, usize, usize) -> Sc + Send + Sync>;
/// Match weight for grouped terminals: group key plus aggregate.
pub type GroupWeightFn<Sc> = Arc<dyn Fn(&Value, &Aggregate) -> Sc + Send + Sync>;
/// Produces the full key universe for `complement`.
pub type KeyUniverseFn<Sc> = Arc<dyn Fn(&Solution<Sc>) -> Vec<Value> + Send + Sync>;

/// A terminated stream waiting for its name.
pub struct ConstraintBuilder<Sc: Score> {
    pub(crate) impact: ImpactType,
    pub(crate) kind: ConstraintKind<Sc>,
}

impl<Sc: Score> ConstraintBuilder<Sc> {
    /// Names the constraint, completing its definition.
    pub fn as_constraint(self, name: impl Into<String>) -> Constraint<Sc> {
        self.as_constraint_in("", name)
    }

    /// Names the constraint within a package.
    pub fn as_constraint_in(
        self,
        package: impl Into<String>,
        name: impl Into<String>,
    ) -> Constraint<Sc> {
        Constraint {
            constraint_ref: ConstraintRef::new(package, name),
            impact: self.impact,
            kind: self.kind,
        }
    }
}
