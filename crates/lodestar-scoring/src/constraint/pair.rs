//! Unique-pair constraint within one class.
//!
//! Pairs are (earlier, later) by entity position: exactly n(n-1)/2
//! candidates, no self-pairs, no (A,B)/(B,A) duplicates. Joiner closures
//! always see the earlier entity as the left side.
//!
//! The index holds exactly the currently inserted entities, so batched
//! retract/insert around one mutation counts every affected pair once:
//! retracting A removes (A,B); retracting B afterwards no longer sees A.

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};

use crate::analysis::{ConstraintMatch, EntityRef};
use crate::stream::joiner::Joiner;
use crate::stream::PairWeightFn;

use std::collections::BTreeSet;
use std::sync::Arc;

use super::indexes::{JoinIndex, Side};
use super::{signed, IncrementalConstraint};

pub struct PairConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: [usize; 1],
    joiners: Vec<Joiner<Sc>>,
    weight: PairWeightFn<Sc>,
    index: JoinIndex<Sc>,
    /// Mirror keyed by the right-side equality keys; only needed when an
    /// equality joiner maps the two sides differently.
    mirror: Option<JoinIndex<Sc>>,
}

impl<Sc: Score> PairConstraint<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class: usize,
        joiners: Vec<Joiner<Sc>>,
        weight: PairWeightFn<Sc>,
    ) -> Self {
        // Self-joins keep a single hash index over the equality keys.
        // Orientation of range joiners depends on which pair member is
        // earlier, so everything non-equal is checked per candidate.
        let equals: Vec<Joiner<Sc>> = joiners
            .iter()
            .filter(|j| matches!(j, Joiner::Equal { .. }))
            .cloned()
            .collect();
        let symmetric = equals.iter().all(|j| match j {
            Joiner::Equal { left, right } => Arc::ptr_eq(left, right),
            _ => true,
        });
        let index = JoinIndex::new(&equals, Side::Left);
        let mirror = (!symmetric).then(|| JoinIndex::new(&equals, Side::Right));
        Self {
            constraint_ref,
            impact,
            sources: [class],
            joiners,
            weight,
            index,
            mirror,
        }
    }

    /// Joiner check with the earlier entity on the left.
    fn pair_holds(&self, solution: &Solution<Sc>, a: usize, b: usize) -> bool {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.joiners.iter().all(|j| j.holds(solution, lo, hi))
    }

    fn pair_delta(&self, solution: &Solution<Sc>, a: usize, b: usize) -> Sc {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        signed(self.impact, (self.weight)(solution, lo, hi))
    }

    /// Sum of this entity's pair contributions against the current index.
    fn entity_total(&self, solution: &Solution<Sc>, entity: usize) -> Result<Sc> {
        let mut partners: BTreeSet<usize> =
            self.index.candidates(solution, entity).into_iter().collect();
        if let Some(mirror) = &self.mirror {
            partners.extend(mirror.candidates(solution, entity));
        }
        let mut total = Sc::zero();
        for partner in partners {
            if partner == entity {
                continue;
            }
            if self.pair_holds(solution, entity, partner) {
                total = total
                    .checked_add(&self.pair_delta(solution, entity, partner))
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for PairConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.index.clear();
        if let Some(mirror) = &mut self.mirror {
            mirror.clear();
        }
        let class = self.sources[0];
        let mut total = Sc::zero();
        for entity in 0..solution.entities[class].len() {
            total = total
                .checked_add(&self.entity_total(solution, entity)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            self.index.insert(solution, entity);
            if let Some(mirror) = &mut self.mirror {
                mirror.insert(solution, entity);
            }
        }
        Ok(total)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let class = self.sources[0];
        let n = solution.entities[class].len();
        let mut total = Sc::zero();
        for a in 0..n {
            for b in (a + 1)..n {
                if self.pair_holds(solution, a, b) {
                    total = total
                        .checked_add(&self.pair_delta(solution, a, b))
                        .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
                }
            }
        }
        Ok(total)
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] {
            return Ok(Sc::zero());
        }
        self.index.remove(solution, entity);
        if let Some(mirror) = &mut self.mirror {
            mirror.remove(solution, entity);
        }
        Ok(-self.entity_total(solution, entity)?)
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        if class != self.sources[0] {
            return Ok(Sc::zero());
        }
        let delta = self.entity_total(solution, entity)?;
        self.index.insert(solution, entity);
        if let Some(mirror) = &mut self.mirror {
            mirror.insert(solution, entity);
        }
        Ok(delta)
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let class = self.sources[0];
        let n = solution.entities[class].len();
        let mut out = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if !self.pair_holds(solution, a, b) {
                    continue;
                }
                let id_a = solution.entities[class][a].id;
                let id_b = solution.entities[class][b].id;
                out.push(ConstraintMatch::new(
                    self.constraint_ref.clone(),
                    self.pair_delta(solution, a, b),
                    vec![
                        EntityRef::new(class, a, id_a),
                        EntityRef::new(class, b, id_b),
                    ],
                    format!("pair ids=({id_a}, {id_b})"),
                ));
            }
        }
        Ok(out)
    }
}

impl<Sc: Score> std::fmt::Debug for PairConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairConstraint")
            .field("name", &self.constraint_ref.name)
            .field("impact", &self.impact)
            .field("class", &self.sources[0])
            .field("joiners", &self.joiners)
            .finish()
    }
}
