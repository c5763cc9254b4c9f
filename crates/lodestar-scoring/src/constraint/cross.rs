//! Cross-class join constraint: every (a, b) pair passing the joiners.

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::{ConstraintRef, ImpactType};

use crate::analysis::{ConstraintMatch, EntityRef};
use crate::stream::joiner::Joiner;
use crate::stream::PairWeightFn;

use super::indexes::{residual_joiners, JoinIndex, Side};
use super::{signed, IncrementalConstraint};

pub struct CrossConstraint<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact: ImpactType,
    sources: Vec<usize>,
    class_a: usize,
    class_b: usize,
    joiners: Vec<Joiner<Sc>>,
    residual: Vec<Joiner<Sc>>,
    weight: PairWeightFn<Sc>,
    /// A-side members, probed when a B entity changes.
    index_a: JoinIndex<Sc>,
    /// B-side members, probed when an A entity changes.
    index_b: JoinIndex<Sc>,
}

impl<Sc: Score> CrossConstraint<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        class_a: usize,
        class_b: usize,
        joiners: Vec<Joiner<Sc>>,
        weight: PairWeightFn<Sc>,
    ) -> Self {
        let sources = if class_a == class_b {
            vec![class_a]
        } else {
            vec![class_a, class_b]
        };
        let index_a = JoinIndex::new(&joiners, Side::Left);
        let index_b = JoinIndex::new(&joiners, Side::Right);
        let residual = residual_joiners(&joiners);
        Self {
            constraint_ref,
            impact,
            sources,
            class_a,
            class_b,
            joiners,
            residual,
            weight,
            index_a,
            index_b,
        }
    }

    fn residual_holds(&self, solution: &Solution<Sc>, a: usize, b: usize) -> bool {
        self.residual.iter().all(|j| j.holds(solution, a, b))
    }

    /// Every joiner, index-backed ones included; used by the stateless path.
    fn all_hold(&self, solution: &Solution<Sc>, a: usize, b: usize) -> bool {
        self.joiners.iter().all(|j| j.holds(solution, a, b))
    }

    fn delta(&self, solution: &Solution<Sc>, a: usize, b: usize) -> Sc {
        signed(self.impact, (self.weight)(solution, a, b))
    }

    /// Total contribution of one A entity against the current B index.
    fn a_total(&self, solution: &Solution<Sc>, a: usize) -> Result<Sc> {
        let mut total = Sc::zero();
        for b in self.index_b.candidates(solution, a) {
            if self.class_a == self.class_b && a == b {
                continue;
            }
            if self.residual_holds(solution, a, b) {
                total = total
                    .checked_add(&self.delta(solution, a, b))
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }

    /// Total contribution of one B entity against the current A index.
    fn b_total(&self, solution: &Solution<Sc>, b: usize) -> Result<Sc> {
        let mut total = Sc::zero();
        for a in self.index_a.candidates(solution, b) {
            if self.class_a == self.class_b && a == b {
                continue;
            }
            if self.residual_holds(solution, a, b) {
                total = total
                    .checked_add(&self.delta(solution, a, b))
                    .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            }
        }
        Ok(total)
    }
}

impl<Sc: Score> IncrementalConstraint<Sc> for CrossConstraint<Sc> {
    fn constraint_ref(&self) -> &ConstraintRef {
        &self.constraint_ref
    }

    fn source_classes(&self) -> &[usize] {
        &self.sources
    }

    fn initialize(&mut self, solution: &Solution<Sc>) -> Result<Sc> {
        self.index_a.clear();
        self.index_b.clear();
        for a in 0..solution.entities[self.class_a].len() {
            self.index_a.insert(solution, a);
        }
        for b in 0..solution.entities[self.class_b].len() {
            self.index_b.insert(solution, b);
        }
        let mut total = Sc::zero();
        for a in 0..solution.entities[self.class_a].len() {
            total = total
                .checked_add(&self.a_total(solution, a)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        Ok(total)
    }

    fn evaluate(&self, solution: &Solution<Sc>) -> Result<Sc> {
        let mut total = Sc::zero();
        for a in 0..solution.entities[self.class_a].len() {
            for b in 0..solution.entities[self.class_b].len() {
                if self.class_a == self.class_b && a == b {
                    continue;
                }
                if self.all_hold(solution, a, b) {
                    total = total
                        .checked_add(&self.delta(solution, a, b))
                        .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
                }
            }
        }
        Ok(total)
    }

    fn on_retract(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        let mut delta = Sc::zero();
        if class == self.class_a {
            self.index_a.remove(solution, entity);
            delta = delta
                .checked_sub(&self.a_total(solution, entity)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        if class == self.class_b {
            self.index_b.remove(solution, entity);
            delta = delta
                .checked_sub(&self.b_total(solution, entity)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
        }
        Ok(delta)
    }

    fn on_insert(&mut self, solution: &Solution<Sc>, class: usize, entity: usize) -> Result<Sc> {
        let mut delta = Sc::zero();
        if class == self.class_a {
            delta = delta
                .checked_add(&self.a_total(solution, entity)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            self.index_a.insert(solution, entity);
        }
        if class == self.class_b {
            delta = delta
                .checked_add(&self.b_total(solution, entity)?)
                .ok_or_else(|| SolverError::ScoreOverflow(self.constraint_ref.full_name()))?;
            self.index_b.insert(solution, entity);
        }
        Ok(delta)
    }

    fn collect_matches(&self, solution: &Solution<Sc>) -> Result<Vec<ConstraintMatch<Sc>>> {
        let mut out = Vec::new();
        for a in 0..solution.entities[self.class_a].len() {
            for b in 0..solution.entities[self.class_b].len() {
                if self.class_a == self.class_b && a == b {
                    continue;
                }
                if !self.all_hold(solution, a, b) {
                    continue;
                }
                let id_a = solution.entities[self.class_a][a].id;
                let id_b = solution.entities[self.class_b][b].id;
                out.push(ConstraintMatch::new(
                    self.constraint_ref.clone(),
                    self.delta(solution, a, b),
                    vec![
                        EntityRef::new(self.class_a, a, id_a),
                        EntityRef::new(self.class_b, b, id_b),
                    ],
                    format!("join ids=({id_a}, {id_b})"),
                ));
            }
        }
        Ok(out)
    }
}

impl<Sc: Score> std::fmt::Debug for CrossConstraint<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossConstraint")
            .field("name", &self.constraint_ref.name)
            .field("impact", &self.impact)
            .field("class_a", &self.class_a)
            .field("class_b", &self.class_b)
            .finish()
    }
}
