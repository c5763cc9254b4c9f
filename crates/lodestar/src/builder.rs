//! Wires a `SolverConfig` into concrete phases, acceptors, and terminations.

use std::sync::Arc;

use tracing::debug;

use lodestar_config::{AcceptorConfig, PhaseConfig, SolverConfig};
use lodestar_core::domain::{DomainRegistry, Solution};
use lodestar_core::error::{Result, SolverError};
use lodestar_core::score::ParseableScore;
use lodestar_scoring::{ConstraintSet, EnvironmentMode, ScoreDirector};
use lodestar_solver::{
    BestScoreTermination, ChangeMoveSelector, ConstructionHeuristicPhase, HillClimbingAcceptor,
    LateAcceptanceAcceptor, ListChangeMoveSelector, ListSwapMoveSelector, LocalSearchPhase,
    MoveSelector, NeverTermination, OrTermination, Phase, SimulatedAnnealingAcceptor, Solver,
    SolverJobManager, StepCountTermination, SwapMoveSelector, TabuSearchAcceptor, Termination,
    TimeTermination, TwoOptMoveSelector, UnimprovedTimeTermination, UnionMoveSelector,
};

const DEFAULT_ACCEPTED_COUNT_LIMIT: usize = 1;
const DEFAULT_SELECTED_COUNT_LIMIT: usize = 128;

/// Builds solvers from a [`SolverConfig`].
///
/// The builder validates the config once up front; everything after that is
/// infallible, so it can hand out a fresh solver per job.
#[derive(Debug, Clone)]
pub struct SolverBuilder<Sc: ParseableScore> {
    config: SolverConfig,
    best_score_limit: Option<Sc>,
}

impl<Sc: ParseableScore> SolverBuilder<Sc> {
    pub fn new(config: SolverConfig) -> Result<Self> {
        let best_score_limit = config
            .termination
            .as_ref()
            .and_then(|t| t.best_score_limit.as_deref())
            .map(|text| {
                Sc::parse(text)
                    .map_err(|e| SolverError::Config(format!("bad best_score_limit: {e}")))
            })
            .transpose()?;
        Ok(Self {
            config,
            best_score_limit,
        })
    }

    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = SolverConfig::from_toml_file(path)
            .map_err(|e| SolverError::Config(e.to_string()))?;
        Self::new(config)
    }

    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = SolverConfig::from_yaml_file(path)
            .map_err(|e| SolverError::Config(e.to_string()))?;
        Self::new(config)
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        match self.config.environment_mode {
            lodestar_config::EnvironmentMode::Reproducible => EnvironmentMode::Reproducible,
            lodestar_config::EnvironmentMode::FullAssert => EnvironmentMode::FullAssert,
        }
    }

    /// Assembles a fresh solver for the given domain.
    pub fn build_solver(&self, registry: &Arc<DomainRegistry>) -> Solver<Sc> {
        assemble(&self.config, self.best_score_limit, registry)
    }

    /// Builds a score director in the configured environment mode.
    pub fn build_director(
        &self,
        problem: Solution<Sc>,
        constraints: ConstraintSet<Sc>,
    ) -> Result<ScoreDirector<Sc>> {
        ScoreDirector::new(problem, constraints, self.environment_mode())
    }

    /// Solves one problem synchronously on the calling thread.
    pub fn solve(
        &self,
        problem: Solution<Sc>,
        constraints: ConstraintSet<Sc>,
    ) -> Result<Solution<Sc>> {
        let registry = Arc::clone(problem.registry());
        let mut solver = self.build_solver(&registry);
        let director = self.build_director(problem, constraints)?;
        solver.solve(director)
    }

    /// Builds a job manager that runs each submitted problem on its own
    /// worker thread with a solver assembled from this config.
    pub fn build_manager(
        &self,
        registry: &Arc<DomainRegistry>,
        constraints: ConstraintSet<Sc>,
    ) -> SolverJobManager<Sc> {
        let config = self.config.clone();
        let limit = self.best_score_limit;
        let registry = Arc::clone(registry);
        SolverJobManager::new(
            constraints,
            self.environment_mode(),
            Arc::new(move || assemble(&config, limit, &registry)),
        )
    }
}

fn assemble<Sc: ParseableScore>(
    config: &SolverConfig,
    best_score_limit: Option<Sc>,
    registry: &Arc<DomainRegistry>,
) -> Solver<Sc> {
    let phases = if config.phases.is_empty() {
        default_phases(registry)
    } else {
        config
            .phases
            .iter()
            .map(|phase| build_phase(phase, registry))
            .collect()
    };
    debug!(phases = phases.len(), "assembled solver pipeline");

    let mut solver =
        Solver::new(phases).with_termination(build_termination(config, best_score_limit));
    if let Some(seed) = config.random_seed {
        solver = solver.with_seed(seed);
    }
    solver
}

/// Construction followed by late-acceptance local search.
fn default_phases<Sc: ParseableScore>(
    registry: &Arc<DomainRegistry>,
) -> Vec<Box<dyn Phase<Sc>>> {
    vec![
        Box::new(ConstructionHeuristicPhase::new()),
        Box::new(LocalSearchPhase::new(
            domain_selector(registry),
            Box::new(LateAcceptanceAcceptor::default()),
            DEFAULT_ACCEPTED_COUNT_LIMIT,
            DEFAULT_SELECTED_COUNT_LIMIT,
        )),
    ]
}

fn build_phase<Sc: ParseableScore>(
    phase: &PhaseConfig,
    registry: &Arc<DomainRegistry>,
) -> Box<dyn Phase<Sc>> {
    match phase {
        PhaseConfig::ConstructionHeuristic(_) => Box::new(ConstructionHeuristicPhase::new()),
        PhaseConfig::LocalSearch(local_search) => {
            let acceptor: Box<dyn lodestar_solver::Acceptor<Sc>> =
                match local_search.acceptor.as_ref() {
                    None => Box::new(LateAcceptanceAcceptor::default()),
                    Some(AcceptorConfig::HillClimbing) => Box::new(HillClimbingAcceptor::new()),
                    Some(AcceptorConfig::TabuSearch(tabu)) => match tabu.tabu_size {
                        Some(size) => Box::new(TabuSearchAcceptor::new(size)),
                        None => Box::new(TabuSearchAcceptor::default()),
                    },
                    Some(AcceptorConfig::SimulatedAnnealing(annealing)) => {
                        Box::new(SimulatedAnnealingAcceptor::new(
                            annealing.starting_temperature.unwrap_or(1.0),
                            annealing.decay.unwrap_or(0.99),
                        ))
                    }
                    Some(AcceptorConfig::LateAcceptance(late)) => match late.late_acceptance_size {
                        Some(size) => Box::new(LateAcceptanceAcceptor::new(size)),
                        None => Box::new(LateAcceptanceAcceptor::default()),
                    },
                };
            Box::new(LocalSearchPhase::new(
                domain_selector(registry),
                acceptor,
                local_search
                    .accepted_count_limit
                    .unwrap_or(DEFAULT_ACCEPTED_COUNT_LIMIT),
                local_search
                    .selected_count_limit
                    .unwrap_or(DEFAULT_SELECTED_COUNT_LIMIT),
            ))
        }
    }
}

/// Union of every move type the domain supports: change and swap for basic
/// variables, relocate, swap, and two-opt for list variables.
fn domain_selector<Sc: ParseableScore>(
    registry: &Arc<DomainRegistry>,
) -> Box<dyn MoveSelector<Sc>> {
    let mut selectors: Vec<Box<dyn MoveSelector<Sc>>> = Vec::new();
    for (class_idx, class) in registry.entity_classes().iter().enumerate() {
        for &field_idx in &class.genuine_variable_indices {
            if class.fields[field_idx].is_list_variable() {
                continue;
            }
            selectors.push(Box::new(ChangeMoveSelector::new(class_idx, field_idx)));
            selectors.push(Box::new(SwapMoveSelector::new(class_idx, field_idx)));
        }
    }
    for plan in registry.list_plans() {
        selectors.push(Box::new(ListChangeMoveSelector::new(
            plan.owner_class,
            plan.owner_field,
        )));
        selectors.push(Box::new(ListSwapMoveSelector::new(
            plan.owner_class,
            plan.owner_field,
        )));
        selectors.push(Box::new(TwoOptMoveSelector::new(
            plan.owner_class,
            plan.owner_field,
        )));
    }
    Box::new(UnionMoveSelector::new(selectors))
}

fn build_termination<Sc: ParseableScore>(
    config: &SolverConfig,
    best_score_limit: Option<Sc>,
) -> Box<dyn Termination<Sc>> {
    let mut terminations: Vec<Box<dyn Termination<Sc>>> = Vec::new();
    if let Some(termination) = config.termination.as_ref() {
        if let Some(limit) = termination.time_limit() {
            terminations.push(Box::new(TimeTermination::new(limit)));
        }
        if let Some(limit) = termination.unimproved_time_limit() {
            terminations.push(Box::new(UnimprovedTimeTermination::new(limit)));
        }
        if let Some(limit) = termination.step_count_limit {
            terminations.push(Box::new(StepCountTermination::new(limit)));
        }
        if let Some(target) = best_score_limit {
            terminations.push(Box::new(BestScoreTermination::new(target)));
        }
    }
    if terminations.is_empty() {
        Box::new(NeverTermination)
    } else {
        Box::new(OrTermination::new(terminations))
    }
}
