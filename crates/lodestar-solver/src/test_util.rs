//! Shared fixtures: a shift rostering model with basic variables and a
//! vehicle routing model with a list variable plus shadows.

use std::sync::Arc;

use lodestar_core::domain::{
    CascadeFn, DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType,
    ShadowKind, Solution, Value, ValueRangeDef,
};
use lodestar_core::score::HardSoftScore;

use lodestar_scoring::stream::{joiner, ConstraintFactory};
use lodestar_scoring::{Constraint, ConstraintSet, EnvironmentMode, ScoreDirector};

/// Call at the top of a test to see solver logs under `--nocapture`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const SHIFT: usize = 0;
pub const EMPLOYEE: usize = 0;
pub const START: usize = 1;
pub const END: usize = 2;

pub fn shift_registry() -> Arc<DomainRegistry> {
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
pub fn shift_solution(
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

pub fn shift_constraints(registry: &Arc<DomainRegistry>) -> Vec<Constraint<HardSoftScore>> {
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
        .penalize(HardSoftScore::of_hard(10))
        .as_constraint("unassigned shift");
    vec![overlap, unassigned]
}

pub fn shift_director(
    registry: &Arc<DomainRegistry>,
    employees: usize,
    shifts: &[(Option<usize>, i64, i64)],
) -> ScoreDirector<HardSoftScore> {
    let solution = shift_solution(registry, employees, shifts);
    let set = ConstraintSet::build(shift_constraints(registry)).unwrap();
    ScoreDirector::new(solution, set, EnvironmentMode::FullAssert).unwrap()
}

pub const VEHICLE: usize = 0;
pub const VISIT: usize = 1;
pub const VISITS: usize = 0;
pub const DURATION: usize = 0;
pub const ARRIVAL: usize = 3;

pub fn routing_registry() -> Arc<DomainRegistry> {
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

pub fn routing_constraints(registry: &Arc<DomainRegistry>) -> Vec<Constraint<HardSoftScore>> {
    let factory = ConstraintFactory::new(Arc::clone(registry));
    let total_arrival = factory
        .for_each("Visit")
        .unwrap()
        .filter(|sol, v| sol.entities[VISIT][v].fields[ARRIVAL].is_some())
        .penalize_by(|sol, v| {
            HardSoftScore::of_soft(sol.entities[VISIT][v].fields[ARRIVAL].as_int().unwrap())
        })
        .as_constraint("total arrival time");
    let unassigned_visit = factory
        .for_each("Visit")
        .unwrap()
        .filter(|sol, v| sol.entities[VISIT][v].fields[ARRIVAL].is_none())
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint("unassigned visit");
    vec![total_arrival, unassigned_visit]
}

/// Vehicles start with empty visit lists; visits get durations `1..=n`.
pub fn routing_director(
    registry: &Arc<DomainRegistry>,
    vehicles: usize,
    visits: usize,
) -> ScoreDirector<HardSoftScore> {
    let mut solution: Solution<HardSoftScore> = Solution::new(Arc::clone(registry));
    for v in 0..vehicles {
        solution.add_entity(VEHICLE, Entity::new(v as i64, vec![Value::List(vec![])]));
    }
    for i in 0..visits {
        solution.add_entity(VISIT, Entity::new(i as i64, vec![Value::Int(i as i64 + 1)]));
    }
    let set = ConstraintSet::build(routing_constraints(registry)).unwrap();
    ScoreDirector::new(solution, set, EnvironmentMode::FullAssert).unwrap()
}
