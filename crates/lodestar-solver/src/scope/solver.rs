//! Solver-level scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tracing::debug;

use lodestar_core::domain::Solution;
use lodestar_core::error::Result;
use lodestar_core::score::Score;
use lodestar_scoring::ScoreDirector;

/// Invoked on the solving thread every time the best solution improves.
pub type BestSolutionCallback<Sc> = Arc<dyn Fn(&Solution<Sc>, Sc) + Send + Sync>;

/// Top-level scope for one solving run.
pub struct SolverScope<Sc: Score> {
    director: ScoreDirector<Sc>,
    best_solution: Option<Solution<Sc>>,
    best_score: Option<Sc>,
    best_initialized: bool,
    rng: ChaCha8Rng,
    start_time: Instant,
    last_improvement: Instant,
    total_step_count: u64,
    terminate_early_flag: Arc<AtomicBool>,
    best_callback: Option<BestSolutionCallback<Sc>>,
}

impl<Sc: Score> SolverScope<Sc> {
    pub fn new(director: ScoreDirector<Sc>) -> Self {
        Self::with_seed(director, rand::random())
    }

    pub fn with_seed(director: ScoreDirector<Sc>, seed: u64) -> Self {
        let now = Instant::now();
        Self {
            director,
            best_solution: None,
            best_score: None,
            best_initialized: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            start_time: now,
            last_improvement: now,
            total_step_count: 0,
            terminate_early_flag: Arc::new(AtomicBool::new(false)),
            best_callback: None,
        }
    }

    pub fn set_terminate_early_flag(&mut self, flag: Arc<AtomicBool>) {
        self.terminate_early_flag = flag;
    }

    pub fn set_best_solution_callback(&mut self, callback: BestSolutionCallback<Sc>) {
        self.best_callback = Some(callback);
    }

    pub fn start_solving(&mut self) {
        self.start_time = Instant::now();
        self.last_improvement = self.start_time;
        self.total_step_count = 0;
    }

    pub fn director(&self) -> &ScoreDirector<Sc> {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut ScoreDirector<Sc> {
        &mut self.director
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Split borrow for selectors that read the director while drawing
    /// from the rng.
    pub fn director_and_rng(&mut self) -> (&ScoreDirector<Sc>, &mut ChaCha8Rng) {
        (&self.director, &mut self.rng)
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn time_since_improvement(&self) -> std::time::Duration {
        self.last_improvement.elapsed()
    }

    pub fn best_score(&self) -> Option<Sc> {
        self.best_score
    }

    pub fn best_solution(&self) -> Option<&Solution<Sc>> {
        self.best_solution.as_ref()
    }

    pub fn calculate_score(&mut self) -> Result<Sc> {
        self.director.calculate_score()
    }

    /// Snapshots the working solution as the new best if it improves.
    ///
    /// Completeness outranks score: a fully assigned candidate replaces an
    /// incomplete incumbent no matter the scores, and an incomplete
    /// candidate never replaces a fully assigned one.
    pub fn update_best_solution(&mut self) -> Result<()> {
        let current = self.director.calculate_score()?;
        let initialized = self.director.solution().is_initialized();
        let improved = match self.best_score {
            None => true,
            Some(best) if initialized == self.best_initialized => current > best,
            Some(_) => initialized,
        };
        if improved {
            debug!(score = %current, step = self.total_step_count, "new best solution");
            let snapshot = self.director.snapshot()?;
            if let Some(callback) = &self.best_callback {
                callback(&snapshot, current);
            }
            self.best_solution = Some(snapshot);
            self.best_score = Some(current);
            self.best_initialized = initialized;
            self.last_improvement = Instant::now();
        }
        Ok(())
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.total_step_count += 1;
        self.total_step_count
    }

    pub fn total_step_count(&self) -> u64 {
        self.total_step_count
    }

    pub fn is_terminate_early(&self) -> bool {
        self.terminate_early_flag.load(Ordering::SeqCst)
    }

    /// Best solution if any improvement was recorded, else the working one.
    pub fn take_best_or_working_solution(mut self) -> Result<Solution<Sc>> {
        match self.best_solution.take() {
            Some(best) => Ok(best),
            None => self.director.into_solution(),
        }
    }
}
