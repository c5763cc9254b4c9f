//! End-to-end tests through the public API.

use std::sync::Arc;
use std::time::Duration;

use lodestar_config::{SolverConfig, TerminationConfig};

use crate::prelude::*;
use crate::{SolverError, SolverStatus};

const SHIFT: usize = 0;
const EMPLOYEE: usize = 0;
const START: usize = 1;
const END: usize = 2;

fn shift_registry() -> Arc<DomainRegistry> {
    let mut registry = DomainRegistry::new();
    registry
        .register_fact(FactClassDef::new(
            "Employee",
            vec![FieldDef::new("name", FieldType::Str)],
        ))
        .unwrap();
    registry
        .register_value_range("employees", ValueRangeDef::FactClass("Employee".into()))
        .unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Shift",
            vec![
                FieldDef::variable("employee", FieldType::Ref, "employees"),
                FieldDef::new("start", FieldType::I64),
                FieldDef::new("end", FieldType::I64),
            ],
        ))
        .unwrap();
    registry.freeze().unwrap()
}

fn shift_problem(
    registry: &Arc<DomainRegistry>,
    employees: usize,
    windows: &[(i64, i64)],
) -> Solution<HardSoftScore> {
    let mut problem = Solution::new(Arc::clone(registry));
    for i in 0..employees {
        problem.add_fact(
            0,
            Fact::new(i as i64, vec![Value::Str(format!("emp{i}").into())]),
        );
    }
    for (i, &(start, end)) in windows.iter().enumerate() {
        problem.add_entity(
            SHIFT,
            Entity::new(
                i as i64,
                vec![Value::None, Value::Int(start), Value::Int(end)],
            ),
        );
    }
    problem
}

fn shift_constraints(registry: &Arc<DomainRegistry>) -> ConstraintSet<HardSoftScore> {
    let factory = ConstraintFactory::new(Arc::clone(registry));
    let overlap = factory
        .for_each_unique_pair(
            "Shift",
            vec![
                joiner::equal(|sol: &Solution<HardSoftScore>, s: usize| {
                    sol.entities[SHIFT][s].fields[EMPLOYEE].clone()
                }),
                joiner::overlapping(
                    |sol: &Solution<HardSoftScore>, s: usize| {
                        sol.entities[SHIFT][s].fields[START].clone()
                    },
                    |sol: &Solution<HardSoftScore>, s: usize| {
                        sol.entities[SHIFT][s].fields[END].clone()
                    },
                ),
            ],
        )
        .unwrap()
        .filter(|sol, a, _b| sol.entities[SHIFT][a].fields[EMPLOYEE].is_some())
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint("overlapping shift");
    let unassigned = factory
        .for_each("Shift")
        .unwrap()
        .filter(|sol, s| sol.entities[SHIFT][s].fields[EMPLOYEE].is_none())
        .penalize(HardSoftScore::of_hard(1))
        .as_constraint("unassigned shift");
    ConstraintSet::build(vec![overlap, unassigned]).unwrap()
}

fn bounded_config(steps: u64) -> SolverConfig {
    SolverConfig {
        random_seed: Some(7),
        termination: Some(TerminationConfig {
            step_count_limit: Some(steps),
            ..TerminationConfig::default()
        }),
        ..SolverConfig::default()
    }
}

#[test]
fn default_pipeline_solves_a_rostering_problem() {
    let registry = shift_registry();
    let builder: SolverBuilder<HardSoftScore> = SolverBuilder::new(bounded_config(40)).unwrap();

    let solution = builder
        .solve(
            shift_problem(&registry, 2, &[(0, 10), (5, 15)]),
            shift_constraints(&registry),
        )
        .unwrap();

    assert_eq!(solution.score, Some(HardSoftScore::ZERO));
}

#[test]
fn configured_pipeline_from_toml() {
    let toml = r#"
        random_seed = 11

        [termination]
        step_count_limit = 60
        best_score_limit = "0hard/0soft"

        [[phases]]
        type = "construction_heuristic"

        [[phases]]
        type = "local_search"
        accepted_count_limit = 1
        selected_count_limit = 32
        [phases.acceptor]
        type = "hill_climbing"
    "#;
    let config = SolverConfig::from_toml_str(toml).unwrap();
    let builder: SolverBuilder<HardSoftScore> = SolverBuilder::new(config).unwrap();
    let registry = shift_registry();

    let solution = builder
        .solve(
            shift_problem(&registry, 3, &[(0, 10), (0, 10), (0, 10)]),
            shift_constraints(&registry),
        )
        .unwrap();

    assert_eq!(solution.score, Some(HardSoftScore::ZERO));
}

#[test]
fn manager_built_from_config_runs_jobs() {
    let registry = shift_registry();
    let builder: SolverBuilder<HardSoftScore> = SolverBuilder::new(bounded_config(30)).unwrap();
    let manager = builder.build_manager(&registry, shift_constraints(&registry));

    let id = manager
        .start(shift_problem(&registry, 2, &[(0, 10), (20, 30)]))
        .unwrap();
    let solution = manager.join(id).unwrap();

    assert_eq!(solution.score, Some(HardSoftScore::ZERO));
    assert_eq!(manager.status(id), SolverStatus::NotSolving);
}

#[test]
fn bad_best_score_limit_fails_at_build_time() {
    let config = SolverConfig {
        termination: Some(TerminationConfig {
            best_score_limit: Some("not a score".into()),
            ..TerminationConfig::default()
        }),
        ..SolverConfig::default()
    };
    let err = SolverBuilder::<HardSoftScore>::new(config).unwrap_err();
    assert!(matches!(err, SolverError::Config(_)));
}

#[test]
fn explain_surfaces_constraint_breakdown() {
    let registry = shift_registry();
    let builder: SolverBuilder<HardSoftScore> =
        SolverBuilder::new(SolverConfig::default()).unwrap();
    let mut problem = shift_problem(&registry, 1, &[(0, 10), (5, 15)]);
    // Both shifts on the only employee.
    for shift in &mut problem.entities[SHIFT] {
        shift.fields[EMPLOYEE] = Value::FactRef(0, 0);
    }

    let mut director = builder
        .build_director(problem, shift_constraints(&registry))
        .unwrap();
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_hard(-1)
    );
    let explanation = director.explain().unwrap();
    let overlap = explanation
        .constraints
        .iter()
        .find(|a| a.constraint_ref.name == "overlapping shift")
        .unwrap();
    assert_eq!(overlap.score, HardSoftScore::of_hard(-1));
    assert_eq!(overlap.matches.len(), 1);
}

#[test]
fn time_limit_is_honored() {
    let registry = shift_registry();
    let config = SolverConfig {
        random_seed: Some(3),
        termination: Some(TerminationConfig {
            seconds_spent_limit: Some(1),
            step_count_limit: Some(10_000),
            ..TerminationConfig::default()
        }),
        ..SolverConfig::default()
    };
    let builder: SolverBuilder<HardSoftScore> = SolverBuilder::new(config).unwrap();

    let started = std::time::Instant::now();
    let solution = builder
        .solve(
            shift_problem(&registry, 2, &[(0, 10), (5, 15), (12, 20)]),
            shift_constraints(&registry),
        )
        .unwrap();

    assert!(solution.score.is_some());
    assert!(started.elapsed() < Duration::from_secs(30));
}
