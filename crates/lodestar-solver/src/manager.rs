//! Background solver jobs.
//!
//! The manager spawns one worker thread per submitted problem. Jobs share
//! nothing mutable; each gets its own solver and score director, while the
//! compiled constraint set and the registry behind it are shared read-only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::info;

use lodestar_core::domain::Solution;
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::Score;
use lodestar_scoring::{ConstraintSet, EnvironmentMode, ScoreDirector};

use crate::solver::Solver;
use crate::termination::ExternalTermination;

/// Opaque handle to a submitted solving job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Solving,
    NotSolving,
}

/// State a worker thread publishes while it runs.
struct JobShared<Sc: Score> {
    best: Mutex<Option<Solution<Sc>>>,
    solving: AtomicBool,
}

struct Job<Sc: Score> {
    shared: Arc<JobShared<Sc>>,
    terminate: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<Solution<Sc>>>>,
}

/// Runs solver jobs on worker threads.
///
/// The factory produces a fresh solver per job so per-solve state such as
/// tabu lists never leaks between problems.
pub struct SolverJobManager<Sc: Score> {
    constraints: ConstraintSet<Sc>,
    mode: EnvironmentMode,
    factory: Arc<dyn Fn() -> Solver<Sc> + Send + Sync>,
    jobs: Mutex<HashMap<JobId, Job<Sc>>>,
    next_id: AtomicU64,
}

impl<Sc: Score> std::fmt::Debug for SolverJobManager<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverJobManager")
            .field("mode", &self.mode)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}

impl<Sc: Score> SolverJobManager<Sc> {
    pub fn new(
        constraints: ConstraintSet<Sc>,
        mode: EnvironmentMode,
        factory: Arc<dyn Fn() -> Solver<Sc> + Send + Sync>,
    ) -> Self {
        Self {
            constraints,
            mode,
            factory,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Submits a problem and starts solving it on a worker thread.
    pub fn start(&self, problem: Solution<Sc>) -> Result<JobId> {
        let director = ScoreDirector::new(problem, self.constraints.clone(), self.mode)?;
        let mut solver = (self.factory)();

        let external = ExternalTermination::new();
        let terminate = external.flag();
        solver.add_termination(Box::new(external));

        let shared = Arc::new(JobShared {
            best: Mutex::new(None),
            solving: AtomicBool::new(true),
        });
        let publish = Arc::clone(&shared);
        solver = solver.on_best_solution(Arc::new(move |solution, _score| {
            *publish.best.lock().unwrap() = Some(solution.clone());
        }));

        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let worker = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let result = solver.solve(director);
            if let Ok(solution) = &result {
                *worker.best.lock().unwrap() = Some(solution.clone());
            }
            worker.solving.store(false, Ordering::SeqCst);
            result
        });

        info!(job = id.0, "solver job started");
        self.jobs.lock().unwrap().insert(
            id,
            Job {
                shared,
                terminate,
                handle: Some(handle),
            },
        );
        Ok(id)
    }

    /// Unknown job ids report `NotSolving`.
    pub fn status(&self, id: JobId) -> SolverStatus {
        let jobs = self.jobs.lock().unwrap();
        match jobs.get(&id) {
            Some(job) if job.shared.solving.load(Ordering::SeqCst) => SolverStatus::Solving,
            _ => SolverStatus::NotSolving,
        }
    }

    /// Latest best solution the job has published, if any.
    pub fn best_solution(&self, id: JobId) -> Option<Solution<Sc>> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(&id)
            .and_then(|job| job.shared.best.lock().unwrap().clone())
    }

    /// Asks the job to stop after its current step. Returns false for
    /// unknown or already finished jobs.
    pub fn terminate_early(&self, id: JobId) -> bool {
        let jobs = self.jobs.lock().unwrap();
        match jobs.get(&id) {
            Some(job) if job.shared.solving.load(Ordering::SeqCst) => {
                info!(job = id.0, "early termination requested");
                job.terminate.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    /// Blocks until the job finishes and returns its final solution.
    pub fn join(&self, id: JobId) -> Result<Solution<Sc>> {
        let handle = {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.get_mut(&id)
                .and_then(|job| job.handle.take())
                .ok_or_else(|| {
                    SolverError::InvalidState(format!("job {} is not joinable", id.0))
                })?
        };
        handle
            .join()
            .map_err(|_| SolverError::Internal(format!("solver job {} panicked", id.0)))?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use lodestar_core::score::HardSoftScore;
    use lodestar_scoring::{ConstraintSet, EnvironmentMode};

    use crate::heuristic::selector::ChangeMoveSelector;
    use crate::phase::localsearch::HillClimbingAcceptor;
    use crate::phase::{ConstructionHeuristicPhase, LocalSearchPhase, Phase};
    use crate::solver::Solver;
    use crate::termination::StepCountTermination;
    use crate::test_util::{
        init_logging, shift_constraints, shift_registry, shift_solution, EMPLOYEE, SHIFT,
    };

    use super::{SolverJobManager, SolverStatus};

    fn manager(step_limit: Option<u64>) -> SolverJobManager<HardSoftScore> {
        let registry = shift_registry();
        let constraints = ConstraintSet::build(shift_constraints(&registry)).unwrap();
        SolverJobManager::new(
            constraints,
            EnvironmentMode::Reproducible,
            Arc::new(move || {
                let phases: Vec<Box<dyn Phase<HardSoftScore>>> = vec![
                    Box::new(ConstructionHeuristicPhase::new()),
                    Box::new(LocalSearchPhase::new(
                        Box::new(ChangeMoveSelector::new(SHIFT, EMPLOYEE)),
                        Box::new(HillClimbingAcceptor::new()),
                        1,
                        8,
                    )),
                ];
                let mut solver = Solver::new(phases).with_seed(17);
                if let Some(limit) = step_limit {
                    solver = solver.with_termination(Box::new(StepCountTermination::new(limit)));
                }
                solver
            }),
        )
    }

    #[test]
    fn jobs_run_to_completion_and_publish_results() {
        let registry = shift_registry();
        let manager = manager(Some(50));
        let problem = shift_solution(&registry, 2, &[(None, 0, 10), (None, 20, 30)]);

        let id = manager.start(problem).unwrap();
        let solution = manager.join(id).unwrap();

        assert_eq!(solution.score, Some(HardSoftScore::ZERO));
        assert_eq!(manager.status(id), SolverStatus::NotSolving);
        assert_eq!(
            manager.best_solution(id).unwrap().score,
            Some(HardSoftScore::ZERO)
        );
    }

    #[test]
    fn independent_jobs_do_not_interfere() {
        let registry = shift_registry();
        let manager = manager(Some(50));
        let a = manager
            .start(shift_solution(&registry, 2, &[(None, 0, 10)]))
            .unwrap();
        let b = manager
            .start(shift_solution(&registry, 3, &[(None, 0, 10), (None, 0, 10)]))
            .unwrap();
        assert_ne!(a, b);

        let solution_a = manager.join(a).unwrap();
        let solution_b = manager.join(b).unwrap();
        assert_eq!(solution_a.entities[SHIFT].len(), 1);
        assert_eq!(solution_b.entities[SHIFT].len(), 2);
        assert_eq!(solution_a.score, Some(HardSoftScore::ZERO));
        assert_eq!(solution_b.score, Some(HardSoftScore::ZERO));
    }

    #[test]
    fn terminate_early_stops_an_unbounded_job() {
        init_logging();
        let registry = shift_registry();
        // No step limit: the local search would run forever.
        let manager = manager(None);
        let id = manager
            .start(shift_solution(&registry, 2, &[(None, 0, 10), (None, 0, 10)]))
            .unwrap();

        // Give the worker a moment, then pull the plug.
        std::thread::sleep(Duration::from_millis(20));
        manager.terminate_early(id);
        let solution = manager.join(id).unwrap();

        assert!(solution.score.is_some());
        assert_eq!(manager.status(id), SolverStatus::NotSolving);
        assert!(!manager.terminate_early(id));
    }

    #[test]
    fn unknown_jobs_are_not_solving() {
        let manager = manager(Some(1));
        let registry = shift_registry();
        let id = manager
            .start(shift_solution(&registry, 1, &[(None, 0, 10)]))
            .unwrap();
        manager.join(id).unwrap();

        assert_eq!(manager.status(super::JobId(999)), SolverStatus::NotSolving);
        assert!(manager.best_solution(super::JobId(999)).is_none());
        assert!(manager.join(id).is_err());
    }
}
