//! Solver implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use lodestar_core::domain::Solution;
use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

use crate::phase::Phase;
use crate::scope::{BestSolutionCallback, SolverScope};
use crate::termination::{NeverTermination, OrTermination, Termination};

/// Runs a sequence of phases against one score director until the
/// termination fires or every phase runs out of moves.
///
/// A solver is reusable; `solve` consumes a director and hands back the
/// best solution found. `terminate_early` may be called from another
/// thread while `solve` runs.
pub struct Solver<Sc: Score> {
    phases: Vec<Box<dyn Phase<Sc>>>,
    termination: Box<dyn Termination<Sc>>,
    terminate_early_flag: Arc<AtomicBool>,
    solving: Arc<AtomicBool>,
    seed: Option<u64>,
    best_callback: Option<BestSolutionCallback<Sc>>,
}

impl<Sc: Score> std::fmt::Debug for Solver<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("phases", &self.phases.len())
            .field("termination", &self.termination)
            .field("seed", &self.seed)
            .finish()
    }
}

impl<Sc: Score> Solver<Sc> {
    pub fn new(phases: Vec<Box<dyn Phase<Sc>>>) -> Self {
        Self {
            phases,
            termination: Box::new(NeverTermination),
            terminate_early_flag: Arc::new(AtomicBool::new(false)),
            solving: Arc::new(AtomicBool::new(false)),
            seed: None,
            best_callback: None,
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<Sc>>) -> Self {
        self.termination = termination;
        self
    }

    /// Adds a termination alongside the existing one; whichever fires
    /// first wins.
    pub fn add_termination(&mut self, termination: Box<dyn Termination<Sc>>) {
        let existing = std::mem::replace(
            &mut self.termination,
            Box::new(NeverTermination) as Box<dyn Termination<Sc>>,
        );
        self.termination = Box::new(OrTermination::new(vec![existing, termination]));
    }

    /// Fixes the random seed, making runs reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Registers a callback invoked whenever a new best solution is found.
    pub fn on_best_solution(mut self, callback: BestSolutionCallback<Sc>) -> Self {
        self.best_callback = Some(callback);
        self
    }

    /// Requests early termination. Thread-safe; returns false when the
    /// solver is not currently solving.
    pub fn terminate_early(&self) -> bool {
        if self.solving.load(Ordering::SeqCst) {
            self.terminate_early_flag.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn is_solving(&self) -> bool {
        self.solving.load(Ordering::SeqCst)
    }

    /// Solves, returning the best solution found with its score stamped.
    ///
    /// Termination limits bound the search; running out of time on an
    /// infeasible problem is not an error, the best attained solution is
    /// returned with whatever score it has.
    pub fn solve(&mut self, director: ScoreDirector<Sc>) -> Result<Solution<Sc>> {
        self.solving.store(true, Ordering::SeqCst);
        self.terminate_early_flag.store(false, Ordering::SeqCst);
        let result = self.solve_inner(director);
        self.solving.store(false, Ordering::SeqCst);
        result
    }

    fn solve_inner(&mut self, director: ScoreDirector<Sc>) -> Result<Solution<Sc>> {
        let mut scope = match self.seed {
            Some(seed) => SolverScope::with_seed(director, seed),
            None => SolverScope::new(director),
        };
        scope.set_terminate_early_flag(Arc::clone(&self.terminate_early_flag));
        if let Some(callback) = &self.best_callback {
            scope.set_best_solution_callback(Arc::clone(callback));
        }
        scope.start_solving();
        scope.update_best_solution()?;
        info!(score = %scope.best_score().unwrap_or_default(), "solving started");

        for (index, phase) in self.phases.iter_mut().enumerate() {
            if scope.is_terminate_early() || self.termination.is_terminated(&scope) {
                break;
            }
            debug!(index, name = phase.name(), "starting phase");
            phase.solve(&mut scope, self.termination.as_ref())?;
            debug!(
                index,
                name = phase.name(),
                score = %scope.best_score().unwrap_or_default(),
                "finished phase"
            );
        }

        info!(
            steps = scope.total_step_count(),
            score = %scope.best_score().unwrap_or_default(),
            "solving ended"
        );
        scope.take_best_or_working_solution()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use lodestar_core::score::HardSoftScore;
    use lodestar_scoring::{ConstraintSet, EnvironmentMode, ScoreDirector};

    use crate::heuristic::selector::{ChangeMoveSelector, ListChangeMoveSelector, MoveSelector};
    use crate::phase::localsearch::HillClimbingAcceptor;
    use crate::phase::{ConstructionHeuristicPhase, LocalSearchPhase, Phase};
    use crate::termination::StepCountTermination;
    use crate::test_util::{
        routing_director, routing_registry, shift_constraints, shift_director, shift_registry,
        shift_solution, EMPLOYEE, SHIFT, VEHICLE,
    };

    use super::Solver;

    fn local_search(selector: Box<dyn MoveSelector<HardSoftScore>>) -> Box<dyn Phase<HardSoftScore>> {
        Box::new(LocalSearchPhase::new(
            selector,
            Box::new(HillClimbingAcceptor::new()),
            1,
            16,
        ))
    }

    #[test]
    fn construction_assigns_every_shift_feasibly() {
        // Three employees, three pairwise overlapping shifts: the only
        // feasible assignment uses each employee once.
        let registry = shift_registry();
        let director = shift_director(&registry, 3, &[(None, 0, 10), (None, 0, 10), (None, 0, 10)]);

        let mut solver = Solver::new(vec![Box::new(ConstructionHeuristicPhase::new())
            as Box<dyn Phase<HardSoftScore>>])
        .with_seed(1);
        let solution = solver.solve(director).unwrap();

        assert_eq!(solution.score, Some(HardSoftScore::ZERO));
        let mut used: Vec<_> = (0..3)
            .map(|s| solution.entities[SHIFT][s].fields[EMPLOYEE].clone())
            .collect();
        used.sort();
        used.dedup();
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn construction_places_every_visit() {
        let registry = routing_registry();
        let director = routing_director(&registry, 2, 4);

        let mut solver = Solver::new(vec![Box::new(ConstructionHeuristicPhase::new())
            as Box<dyn Phase<HardSoftScore>>])
        .with_seed(1);
        let solution = solver.solve(director).unwrap();

        let score = solution.score.unwrap();
        assert_eq!(score.hard(), 0, "every visit should be routed: {score}");
        let placed: usize = (0..2)
            .map(|v| {
                solution.entities[VEHICLE][v].fields[0]
                    .as_list()
                    .unwrap()
                    .len()
            })
            .sum();
        assert_eq!(placed, 4);
    }

    #[test]
    fn returned_best_is_a_complete_assignment() {
        // One employee, two overlapping shifts, overlap constraint only:
        // every complete assignment scores worse than the untouched empty
        // solution, which must still not be returned as best.
        let registry = shift_registry();
        let solution = shift_solution(&registry, 1, &[(None, 0, 10), (None, 0, 10)]);
        let overlap_only: Vec<_> = shift_constraints(&registry)
            .into_iter()
            .filter(|c| c.constraint_ref().name == "overlapping shift")
            .collect();
        let set = ConstraintSet::build(overlap_only).unwrap();
        let director = ScoreDirector::new(solution, set, EnvironmentMode::FullAssert).unwrap();

        let mut solver = Solver::new(vec![Box::new(ConstructionHeuristicPhase::new())
            as Box<dyn Phase<HardSoftScore>>])
        .with_seed(2);
        let best = solver.solve(director).unwrap();

        assert!(best.is_initialized(), "best solution left shifts unassigned");
        assert_eq!(best.score, Some(HardSoftScore::of_hard(-1)));
    }

    #[test]
    fn local_search_improves_a_poor_assignment() {
        // Both shifts overlap and start on the same employee.
        let registry = shift_registry();
        let director = shift_director(&registry, 2, &[(Some(0), 0, 10), (Some(0), 0, 10)]);

        let selector = Box::new(ChangeMoveSelector::new(SHIFT, EMPLOYEE));
        let mut solver = Solver::new(vec![local_search(selector)])
            .with_termination(Box::new(StepCountTermination::new(20)))
            .with_seed(3);
        let solution = solver.solve(director).unwrap();

        assert_eq!(solution.score, Some(HardSoftScore::ZERO));
    }

    #[test]
    fn identical_seeds_walk_identical_paths() {
        let run = |seed: u64| {
            let registry = routing_registry();
            let director = routing_director(&registry, 2, 5);
            let phases: Vec<Box<dyn Phase<HardSoftScore>>> = vec![
                Box::new(ConstructionHeuristicPhase::new()),
                local_search(Box::new(ListChangeMoveSelector::new(VEHICLE, 0))),
            ];
            let mut solver = Solver::new(phases)
                .with_termination(Box::new(StepCountTermination::new(30)))
                .with_seed(seed);
            solver.solve(director).unwrap()
        };

        let a = run(11);
        let b = run(11);
        assert_eq!(a.score, b.score);
        for v in 0..2 {
            assert_eq!(
                a.entities[VEHICLE][v].fields[0],
                b.entities[VEHICLE][v].fields[0]
            );
        }
    }

    #[test]
    fn best_solution_callback_sees_monotone_improvement() {
        let registry = shift_registry();
        let director = shift_director(&registry, 2, &[(None, 0, 10), (None, 0, 10)]);

        let improvements = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&improvements);
        let mut solver = Solver::new(vec![Box::new(ConstructionHeuristicPhase::new())
            as Box<dyn Phase<HardSoftScore>>])
        .with_seed(5)
        .on_best_solution(Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let solution = solver.solve(director).unwrap();

        assert_eq!(solution.score, Some(HardSoftScore::ZERO));
        assert!(improvements.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn step_count_termination_bounds_the_search() {
        let registry = shift_registry();
        let director = shift_director(&registry, 2, &[(Some(0), 0, 10), (Some(0), 0, 10)]);

        let selector = Box::new(ChangeMoveSelector::new(SHIFT, EMPLOYEE));
        let mut solver = Solver::new(vec![local_search(selector)])
            .with_termination(Box::new(StepCountTermination::new(1)))
            .with_seed(0);
        let solution = solver.solve(director).unwrap();

        // One step ran; the result still carries a stamped score.
        assert!(solution.score.is_some());
    }
}
