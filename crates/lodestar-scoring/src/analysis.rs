//! Score analysis: which constraints matched, what they cost, who is to blame.
//!
//! Output ordering is deterministic: constraints by full name, matches by
//! indicted entity positions. Two `explain` calls on an unmodified solution
//! produce identical explanations.

use std::collections::BTreeMap;
use std::fmt;

use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_core::ConstraintRef;

/// Position and id of an entity indicted by a constraint match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub class: usize,
    pub index: usize,
    pub id: i64,
}

impl EntityRef {
    pub fn new(class: usize, index: usize, id: i64) -> Self {
        Self { class, index, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}/{}(id={})", self.class, self.index, self.id)
    }
}

/// One concrete match of a constraint, with its signed score impact.
#[derive(Debug, Clone)]
pub struct ConstraintMatch<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub score: Sc,
    pub indicted: Vec<EntityRef>,
    pub justification: String,
}

impl<Sc: Score> ConstraintMatch<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        score: Sc,
        indicted: Vec<EntityRef>,
        justification: String,
    ) -> Self {
        Self {
            constraint_ref,
            score,
            indicted,
            justification,
        }
    }
}

/// Per-constraint aggregate of an explanation.
#[derive(Debug, Clone)]
pub struct ConstraintAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

/// Everything a constraint match holds against one entity.
#[derive(Debug, Clone)]
pub struct Indictment<Sc: Score> {
    pub entity: EntityRef,
    pub total_score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

/// Full score breakdown of a solution.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    pub score: Sc,
    pub constraints: Vec<ConstraintAnalysis<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    /// Builds the explanation from per-constraint matches, sorting both the
    /// constraint list and each match list.
    pub fn from_analyses(mut constraints: Vec<ConstraintAnalysis<Sc>>) -> Result<Self> {
        constraints.sort_by(|a, b| a.constraint_ref.full_name().cmp(&b.constraint_ref.full_name()));
        let mut score = Sc::zero();
        for analysis in &mut constraints {
            analysis
                .matches
                .sort_by(|a, b| (&a.indicted, &a.justification).cmp(&(&b.indicted, &b.justification)));
            score = score
                .checked_add(&analysis.score)
                .ok_or_else(|| SolverError::ScoreOverflow(analysis.constraint_ref.full_name()))?;
        }
        Ok(Self { score, constraints })
    }

    /// Groups matches by indicted entity.
    pub fn indictments(&self) -> Result<BTreeMap<EntityRef, Indictment<Sc>>> {
        let mut map: BTreeMap<EntityRef, Indictment<Sc>> = BTreeMap::new();
        for analysis in &self.constraints {
            for m in &analysis.matches {
                for entity in &m.indicted {
                    let indictment = map.entry(*entity).or_insert_with(|| Indictment {
                        entity: *entity,
                        total_score: Sc::zero(),
                        matches: Vec::new(),
                    });
                    indictment.total_score = indictment
                        .total_score
                        .checked_add(&m.score)
                        .ok_or_else(|| SolverError::ScoreOverflow(m.constraint_ref.full_name()))?;
                    indictment.matches.push(m.clone());
                }
            }
        }
        Ok(map)
    }

    /// Summary line per constraint, mainly for logs.
    pub fn summarize(&self) -> String {
        let mut out = format!("score {}", self.score);
        for analysis in &self.constraints {
            out.push_str(&format!(
                "\n  {}: {} ({} matches)",
                analysis.constraint_ref.full_name(),
                analysis.score,
                analysis.match_count()
            ));
        }
        out
    }
}
