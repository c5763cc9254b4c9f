use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lodestar_core::domain::{
    CascadeFn, DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType,
    ShadowKind, Solution, Value, ValueRangeDef,
};
use lodestar_core::score::HardSoftScore;
use lodestar_core::SolverError;

use crate::stream::{collector, joiner, ConstraintFactory};
use crate::{Constraint, ConstraintSet, EnvironmentMode, ScoreDirector};

// Shift rostering fixture: one entity class "Shift" (class 0) assigning an
// employee fact to a fixed time window.
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

/// Shifts as `(employee fact index or none, start, end)`.
fn shift_solution(
    registry: &Arc<DomainRegistry>,
    employees: usize,
    shifts: &[(Option<usize>, i64, i64)],
) -> Solution<HardSoftScore> {
    let mut solution = Solution::new(Arc::clone(registry));
    for i in 0..employees {
        solution.add_fact(0, Fact::new(i as i64, vec![Value::Str(format!("emp{i}").into())]));
    }
    for (i, &(employee, start, end)) in shifts.iter().enumerate() {
        let employee = match employee {
            Some(e) => Value::FactRef(0, e),
            None => Value::None,
        };
        solution.add_entity(
            SHIFT,
            Entity::new(i as i64, vec![employee, Value::Int(start), Value::Int(end)]),
        );
    }
    solution
}

fn employee_of(solution: &Solution<HardSoftScore>, shift: usize) -> Value {
    solution.entities[SHIFT][shift].fields[EMPLOYEE].clone()
}

fn same_employee_overlap(factory: &ConstraintFactory<HardSoftScore>) -> Constraint<HardSoftScore> {
    factory
        .for_each_unique_pair(
            "Shift",
            vec![
                joiner::equal(employee_of),
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
        .as_constraint("overlapping shift")
}

fn unassigned_shift(factory: &ConstraintFactory<HardSoftScore>) -> Constraint<HardSoftScore> {
    factory
        .for_each("Shift")
        .unwrap()
        .filter(|sol, s| sol.entities[SHIFT][s].fields[EMPLOYEE].is_none())
        .penalize(HardSoftScore::of_hard(10))
        .as_constraint("unassigned shift")
}

fn director(
    solution: Solution<HardSoftScore>,
    constraints: Vec<Constraint<HardSoftScore>>,
    mode: EnvironmentMode,
) -> ScoreDirector<HardSoftScore> {
    let set = ConstraintSet::build(constraints).unwrap();
    ScoreDirector::new(solution, set, mode).unwrap()
}

#[test]
fn unique_pairs_count_each_pair_once() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let shifts: Vec<_> = (0..5).map(|i| (Some(0), i, i + 1)).collect();
    let solution = shift_solution(&registry, 1, &shifts);

    let any_pair = factory
        .for_each_unique_pair("Shift", vec![])
        .unwrap()
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint("any pair");
    let mut director = director(solution, vec![any_pair], EnvironmentMode::FullAssert);

    // 5 entities, n(n-1)/2 = 10 pairs, no self-pairs or mirrored dupes.
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_soft(-10)
    );
}

#[test]
fn three_shifts_sharing_an_employee_cost_three_hard() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let solution = shift_solution(
        &registry,
        2,
        &[
            (Some(0), 0, 10),
            (Some(0), 0, 10),
            (Some(0), 0, 10),
            (Some(1), 0, 10),
        ],
    );

    let mut director = director(
        solution,
        vec![same_employee_overlap(&factory)],
        EnvironmentMode::FullAssert,
    );
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_hard(-3)
    );
}

#[test]
fn overlap_is_half_open() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    // Back-to-back windows share an endpoint but never overlap.
    let solution = shift_solution(&registry, 1, &[(Some(0), 1, 3), (Some(0), 3, 5)]);
    let mut back_to_back = director(
        solution,
        vec![same_employee_overlap(&factory)],
        EnvironmentMode::FullAssert,
    );
    assert_eq!(back_to_back.calculate_score().unwrap(), HardSoftScore::ZERO);

    let solution = shift_solution(&registry, 1, &[(Some(0), 1, 4), (Some(0), 3, 5)]);
    let mut overlapping = director(
        solution,
        vec![same_employee_overlap(&factory)],
        EnvironmentMode::FullAssert,
    );
    assert_eq!(
        overlapping.calculate_score().unwrap(),
        HardSoftScore::of_hard(-1)
    );
}

#[test]
fn lonely_shifts_found_by_if_not_exists() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let solution = shift_solution(
        &registry,
        2,
        &[(Some(0), 0, 4), (Some(0), 4, 8), (Some(1), 0, 4)],
    );

    let lonely = factory
        .for_each("Shift")
        .unwrap()
        .if_not_exists("Shift", vec![joiner::equal(employee_of)])
        .unwrap()
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint("lonely shift");
    let mut director = director(solution, vec![lonely], EnvironmentMode::FullAssert);

    // Only employee 1's single shift has no companion.
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_soft(-1)
    );
}

#[test]
fn complement_pins_idle_employees_into_groups() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let solution = shift_solution(&registry, 3, &[(Some(0), 0, 4), (Some(0), 4, 8), (Some(1), 0, 4)]);

    let idle = factory
        .for_each("Shift")
        .unwrap()
        .filter(|sol, s| sol.entities[SHIFT][s].fields[EMPLOYEE].is_some())
        .group_by(employee_of, collector::count())
        .complement(|sol: &Solution<HardSoftScore>| {
            (0..sol.facts[0].len()).map(|i| Value::FactRef(0, i)).collect()
        })
        .penalize_by(|_key, aggregate| {
            if aggregate.as_count() == 0 {
                HardSoftScore::ONE_SOFT
            } else {
                HardSoftScore::ZERO
            }
        })
        .as_constraint("idle employee");
    let mut director = director(solution, vec![idle], EnvironmentMode::FullAssert);

    // Employee 2 has no shifts but still forms a group.
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_soft(-1)
    );
}

#[test]
fn load_balance_measures_spread_of_assignments() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    // Employee 0 carries 3 shifts, employee 1 carries 1.
    let solution = shift_solution(
        &registry,
        2,
        &[(Some(0), 0, 1), (Some(0), 1, 2), (Some(0), 2, 3), (Some(1), 0, 1)],
    );

    let balance = factory
        .for_each("Shift")
        .unwrap()
        .group_by(employee_of, collector::load_balance(|_sol, _s| 1))
        .complement(|sol: &Solution<HardSoftScore>| {
            (0..sol.facts[0].len()).map(|i| Value::FactRef(0, i)).collect()
        })
        .penalize_by(|_key, aggregate| HardSoftScore::of_soft(aggregate.as_count()))
        .as_constraint("fair workload");
    let mut director = director(solution, vec![balance], EnvironmentMode::FullAssert);

    // Loads (3, 1): sqrt(9 + 1 - 4^2/2) = sqrt(2), rounded to 1.
    assert_eq!(
        director.calculate_score().unwrap(),
        HardSoftScore::of_soft(-1)
    );
}

#[test]
fn load_balance_surfaces_overflowing_loads() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let solution = shift_solution(&registry, 1, &[(Some(0), 0, 1), (Some(0), 1, 2)]);

    // Squaring a 4e9 load exceeds i64; the sum of squares must surface the
    // overflow instead of wrapping into a bogus unfairness.
    let balance = factory
        .for_each("Shift")
        .unwrap()
        .group_by(
            employee_of,
            collector::load_balance(|_sol, _s| 4_000_000_000),
        )
        .penalize_by(|_key, aggregate| HardSoftScore::of_soft(aggregate.as_count()))
        .as_constraint("fair workload");
    let set = ConstraintSet::build(vec![balance]).unwrap();
    let err = ScoreDirector::new(solution, set, EnvironmentMode::Reproducible).unwrap_err();
    assert!(matches!(err, SolverError::ScoreOverflow(name) if name == "fair workload"));
}

#[test]
fn incremental_scores_survive_a_random_walk() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let shifts: Vec<_> = (0..6).map(|i| (None, (i % 3) * 4, (i % 3) * 4 + 5)).collect();
    let solution = shift_solution(&registry, 4, &shifts);

    let constraints = vec![same_employee_overlap(&factory), unassigned_shift(&factory)];
    // FullAssert recomputes every constraint from scratch after each change
    // and fails on the first divergence.
    let mut director = director(solution, constraints, EnvironmentMode::FullAssert);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..200 {
        let shift = rng.random_range(0..6);
        let value = if rng.random_bool(0.1) {
            Value::None
        } else {
            Value::FactRef(0, rng.random_range(0..4))
        };
        director
            .change_variable(SHIFT, shift, EMPLOYEE, value)
            .unwrap();
    }

    let score = director.calculate_score().unwrap();
    assert_eq!(director.explain().unwrap().score, score);
}

#[test]
fn analysis_is_deterministic_on_an_unchanged_solution() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let solution = shift_solution(
        &registry,
        2,
        &[(Some(0), 0, 10), (Some(0), 5, 15), (None, 0, 5)],
    );

    let director = director(
        solution,
        vec![same_employee_overlap(&factory), unassigned_shift(&factory)],
        EnvironmentMode::Reproducible,
    );
    let first = director.explain().unwrap();
    let second = director.explain().unwrap();

    assert_eq!(first.score, second.score);
    assert_eq!(first.summarize(), second.summarize());
    assert_eq!(
        first.indictments().unwrap().len(),
        second.indictments().unwrap().len()
    );
}

#[test]
fn duplicate_constraint_names_fail_at_build() {
    let registry = shift_registry();
    let factory = ConstraintFactory::new(Arc::clone(&registry));
    let result = ConstraintSet::build(vec![
        unassigned_shift(&factory),
        unassigned_shift(&factory),
    ]);
    assert!(matches!(
        result,
        Err(SolverError::DuplicateConstraintName(name)) if name == "unassigned shift"
    ));
}

// Routing fixture for list mutations: vehicles own an ordered visit list,
// visits carry a cumulative arrival-time cascade.
mod list_scoring {
    use super::*;

    const VEHICLE: usize = 0;
    const VISIT: usize = 1;
    const VISITS: usize = 0;
    const DURATION: usize = 0;
    const ARRIVAL: usize = 3;

    fn routing_registry() -> Arc<DomainRegistry> {
        let arrival: CascadeFn = Arc::new(|e: &Entity, prev: Option<&Value>| {
            let base = prev.and_then(|v| v.as_int()).unwrap_or(0);
            Value::Int(base + e.fields[DURATION].as_int().unwrap_or(0))
        });
        let mut registry = DomainRegistry::new();
        registry
            .register_entity(EntityClassDef::new(
                "Vehicle",
                vec![FieldDef::list_variable("visits", "visit_range")],
            ))
            .unwrap();
        registry
            .register_entity(EntityClassDef::new(
                "Visit",
                vec![
                    FieldDef::new("duration", FieldType::I64),
                    FieldDef::shadow(
                        "vehicle",
                        FieldType::Ref,
                        ShadowKind::InverseRelation {
                            source_class: "Vehicle".into(),
                            source_variable: "visits".into(),
                        },
                    ),
                    FieldDef::shadow(
                        "position",
                        FieldType::I64,
                        ShadowKind::Index {
                            source_class: "Vehicle".into(),
                            source_variable: "visits".into(),
                        },
                    ),
                    FieldDef::shadow(
                        "arrival",
                        FieldType::I64,
                        ShadowKind::Cascading {
                            source_fields: vec!["duration".into()],
                            update: arrival,
                        },
                    ),
                ],
            ))
            .unwrap();
        registry
            .register_value_range("visit_range", ValueRangeDef::EntityClass("Visit".into()))
            .unwrap();
        registry.freeze().unwrap()
    }

    fn total_arrival(factory: &ConstraintFactory<HardSoftScore>) -> Constraint<HardSoftScore> {
        factory
            .for_each("Visit")
            .unwrap()
            .filter(|sol, v| sol.entities[VISIT][v].fields[ARRIVAL].is_some())
            .penalize_by(|sol, v| {
                HardSoftScore::of_soft(sol.entities[VISIT][v].fields[ARRIVAL].as_int().unwrap())
            })
            .as_constraint("total arrival time")
    }

    #[test]
    fn list_mutations_keep_scores_and_shadows_aligned() {
        let registry = routing_registry();
        let factory = ConstraintFactory::new(Arc::clone(&registry));
        let mut solution: Solution<HardSoftScore> = Solution::new(Arc::clone(&registry));
        solution.add_entity(VEHICLE, Entity::new(0, vec![Value::List(vec![])]));
        for (i, duration) in [2i64, 3, 4].into_iter().enumerate() {
            solution.add_entity(VISIT, Entity::new(i as i64, vec![Value::Int(duration)]));
        }

        let mut director = super::director(
            solution,
            vec![total_arrival(&factory)],
            EnvironmentMode::FullAssert,
        );
        assert_eq!(director.calculate_score().unwrap(), HardSoftScore::ZERO);

        for i in 0..3 {
            director
                .list_insert(VEHICLE, 0, VISITS, i, Value::Ref(VISIT, i))
                .unwrap();
        }
        // Arrivals 2, 5, 9.
        assert_eq!(
            director.calculate_score().unwrap(),
            HardSoftScore::of_soft(-16)
        );

        let removed = director.list_remove(VEHICLE, 0, VISITS, 1).unwrap();
        assert_eq!(removed, Value::Ref(VISIT, 1));
        // Arrivals 2, 6; the removed visit no longer matches.
        assert_eq!(
            director.calculate_score().unwrap(),
            HardSoftScore::of_soft(-8)
        );
        assert!(director.solution().entities[VISIT][1].fields[ARRIVAL].is_none());
    }

    #[test]
    fn random_list_walk_stays_consistent() {
        let registry = routing_registry();
        let factory = ConstraintFactory::new(Arc::clone(&registry));
        let mut solution: Solution<HardSoftScore> = Solution::new(Arc::clone(&registry));
        for v in 0..2 {
            solution.add_entity(VEHICLE, Entity::new(v, vec![Value::List(vec![])]));
        }
        for i in 0..5 {
            solution.add_entity(VISIT, Entity::new(i as i64, vec![Value::Int(i as i64 + 1)]));
        }

        let mut director = super::director(
            solution,
            vec![total_arrival(&factory)],
            EnvironmentMode::FullAssert,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut unassigned: Vec<usize> = (0..5).collect();
        for _ in 0..100 {
            let assign = !unassigned.is_empty() && (unassigned.len() == 5 || rng.random_bool(0.6));
            if assign {
                let visit = unassigned.swap_remove(rng.random_range(0..unassigned.len()));
                let owner = rng.random_range(0..2);
                let len = director.solution().entities[VEHICLE][owner].fields[VISITS]
                    .as_list()
                    .unwrap()
                    .len();
                let position = rng.random_range(0..=len);
                director
                    .list_insert(VEHICLE, owner, VISITS, position, Value::Ref(VISIT, visit))
                    .unwrap();
            } else {
                let owner = rng.random_range(0..2);
                let len = director.solution().entities[VEHICLE][owner].fields[VISITS]
                    .as_list()
                    .unwrap()
                    .len();
                if len == 0 {
                    continue;
                }
                let removed = director
                    .list_remove(VEHICLE, owner, VISITS, rng.random_range(0..len))
                    .unwrap();
                unassigned.push(removed.as_entity_ref().unwrap().1);
            }
        }

        let score = director.calculate_score().unwrap();
        assert_eq!(director.explain().unwrap().score, score);
    }
}
