use std::sync::Arc;

use crate::error::SolverError;
use crate::score::SimpleScore;

use super::{
    DomainRegistry, Entity, EntityClassDef, Fact, FactClassDef, FieldDef, FieldType,
    ShadowKind, ShadowPropagator, Solution, Value, ValueRangeDef,
};

fn visit_class() -> EntityClassDef {
    // Cumulative arrival time: previous arrival + own duration.
    let arrival_update: super::CascadeFn = Arc::new(|e: &Entity, prev: Option<&Value>| {
        let base = prev.and_then(|v| v.as_int()).unwrap_or(0);
        Value::Int(base + e.fields[0].as_int().unwrap_or(0))
    });
    // Departure rides the arrival pass.
    let departure_update: super::CascadeFn =
        Arc::new(|e: &Entity, _prev: Option<&Value>| match e.fields[5].as_int() {
            Some(arrival) => Value::Int(arrival + 1),
            Option::None => Value::None,
        });
    EntityClassDef::new(
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
                "previous",
                FieldType::Ref,
                ShadowKind::PreviousElement {
                    source_class: "Vehicle".into(),
                    source_variable: "visits".into(),
                },
            ),
            FieldDef::shadow(
                "next",
                FieldType::Ref,
                ShadowKind::NextElement {
                    source_class: "Vehicle".into(),
                    source_variable: "visits".into(),
                },
            ),
            FieldDef::shadow(
                "arrival",
                FieldType::I64,
                ShadowKind::Cascading {
                    source_fields: vec!["duration".into(), "previous".into()],
                    update: arrival_update,
                },
            ),
            FieldDef::shadow(
                "departure",
                FieldType::I64,
                ShadowKind::Piggyback {
                    anchor: "arrival".into(),
                    update: departure_update,
                },
            ),
        ],
    )
}

fn routing_registry() -> Arc<DomainRegistry> {
    let mut registry = DomainRegistry::new();
    registry.register_value_range("visits", ValueRangeDef::EntityClass("Visit".into())).unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Vehicle",
            vec![FieldDef::list_variable("visits", "visits")],
        ))
        .unwrap();
    registry.register_entity(visit_class()).unwrap();
    registry.freeze().unwrap()
}

/// One vehicle with `durations.len()` visits already assigned, shadows fresh.
fn routing_solution(durations: &[i64]) -> Solution<SimpleScore> {
    let registry = routing_registry();
    let mut solution = Solution::new(Arc::clone(&registry));
    let visit_class = registry.entity_class_index("Visit").unwrap();
    let vehicle_class = registry.entity_class_index("Vehicle").unwrap();
    let mut refs = Vec::new();
    for (i, &d) in durations.iter().enumerate() {
        let idx = solution.add_entity(
            visit_class,
            Entity { id: i as i64, fields: vec![Value::Int(d)] },
        );
        refs.push(Value::Ref(visit_class, idx));
    }
    solution.add_entity(
        vehicle_class,
        Entity { id: 100, fields: vec![Value::List(refs)] },
    );
    ShadowPropagator::new(Arc::clone(&registry)).refresh_all(&mut solution);
    solution
}

#[test]
fn registration_rejects_duplicate_class_name() {
    let mut registry = DomainRegistry::new();
    registry
        .register_entity(EntityClassDef::new("Shift", vec![]))
        .unwrap();
    let err = registry
        .register_fact(FactClassDef::new("Shift", vec![]))
        .unwrap_err();
    assert!(matches!(err, SolverError::DuplicateType(name) if name == "Shift"));
}

#[test]
fn freeze_rejects_unregistered_value_range() {
    let mut registry = DomainRegistry::new();
    registry
        .register_entity(EntityClassDef::new(
            "Shift",
            vec![FieldDef::variable("employee", FieldType::Ref, "employees")],
        ))
        .unwrap();
    let err = registry.freeze().unwrap_err();
    match err {
        SolverError::MissingValueRange { class, variable, range } => {
            assert_eq!(class, "Shift");
            assert_eq!(variable, "employee");
            assert_eq!(range, "employees");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn freeze_rejects_list_variable_over_int_range() {
    let mut registry = DomainRegistry::new();
    registry
        .register_value_range("slots", ValueRangeDef::IntRange { min: 0, max: 5 })
        .unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Machine",
            vec![FieldDef::list_variable("jobs", "slots")],
        ))
        .unwrap();
    assert!(matches!(registry.freeze(), Err(SolverError::DomainModel(_))));
}

#[test]
fn freeze_rejects_cyclic_shadow_dependencies() {
    let noop: super::CascadeFn = Arc::new(|_, _| Value::None);
    let mut registry = DomainRegistry::new();
    registry
        .register_entity(EntityClassDef::new(
            "Task",
            vec![
                FieldDef::shadow(
                    "a",
                    FieldType::I64,
                    ShadowKind::Cascading {
                        source_fields: vec!["b".into()],
                        update: Arc::clone(&noop),
                    },
                ),
                FieldDef::shadow(
                    "b",
                    FieldType::I64,
                    ShadowKind::Cascading {
                        source_fields: vec!["a".into()],
                        update: noop,
                    },
                ),
            ],
        ))
        .unwrap();
    let err = registry.freeze().unwrap_err();
    assert!(matches!(err, SolverError::CyclicShadowDependency { class, .. } if class == "Task"));
}

#[test]
fn freeze_rejects_unknown_cascade_source_field() {
    let noop: super::CascadeFn = Arc::new(|_, _| Value::None);
    let mut registry = DomainRegistry::new();
    registry
        .register_entity(EntityClassDef::new(
            "Task",
            vec![FieldDef::shadow(
                "total",
                FieldType::I64,
                ShadowKind::Cascading {
                    source_fields: vec!["weight".into()],
                    update: noop,
                },
            )],
        ))
        .unwrap();
    let err = registry.freeze().unwrap_err();
    assert!(matches!(err, SolverError::DomainModel(msg) if msg.contains("weight")));
}

#[test]
fn resolves_int_and_fact_ranges() {
    let mut registry = DomainRegistry::new();
    registry
        .register_value_range("rows", ValueRangeDef::IntRange { min: 2, max: 5 })
        .unwrap();
    registry
        .register_value_range("rooms", ValueRangeDef::FactClass("Room".into()))
        .unwrap();
    registry
        .register_fact(FactClassDef::new(
            "Room",
            vec![FieldDef::new("capacity", FieldType::I64)],
        ))
        .unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Lesson",
            vec![
                FieldDef::variable("row", FieldType::I64, "rows"),
                FieldDef::variable("room", FieldType::Ref, "rooms"),
            ],
        ))
        .unwrap();
    let registry = registry.freeze().unwrap();

    let mut solution: Solution<SimpleScore> = Solution::new(Arc::clone(&registry));
    let room_class = registry.fact_class_index("Room").unwrap();
    solution.add_fact(room_class, Fact { id: 1, fields: vec![Value::Int(30)] });
    solution.add_fact(room_class, Fact { id: 2, fields: vec![Value::Int(40)] });

    let lesson_class = registry.entity_class_index("Lesson").unwrap();
    let rows = registry.resolve_value_range(lesson_class, 0, &solution).unwrap();
    assert_eq!(rows, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
    let rooms = registry.resolve_value_range(lesson_class, 1, &solution).unwrap();
    assert_eq!(rooms, vec![Value::FactRef(room_class, 0), Value::FactRef(room_class, 1)]);
}

#[test]
fn refresh_populates_all_list_shadows() {
    let solution = routing_solution(&[1, 2, 3, 4, 5]);
    let registry = solution.registry();
    let visit_class = registry.entity_class_index("Visit").unwrap();
    let vehicle_class = registry.entity_class_index("Vehicle").unwrap();

    let expected_arrivals = [1, 3, 6, 10, 15];
    for (i, visit) in solution.entities[visit_class].iter().enumerate() {
        assert_eq!(visit.fields[1], Value::Ref(vehicle_class, 0), "inverse of visit {i}");
        assert_eq!(visit.fields[2], Value::Int(i as i64), "index of visit {i}");
        let expected_prev = if i == 0 {
            Value::None
        } else {
            Value::Ref(visit_class, i - 1)
        };
        assert_eq!(visit.fields[3], expected_prev, "previous of visit {i}");
        let expected_next = if i == 4 {
            Value::None
        } else {
            Value::Ref(visit_class, i + 1)
        };
        assert_eq!(visit.fields[4], expected_next, "next of visit {i}");
        assert_eq!(visit.fields[5], Value::Int(expected_arrivals[i]), "arrival of visit {i}");
        assert_eq!(
            visit.fields[6],
            Value::Int(expected_arrivals[i] + 1),
            "departure of visit {i}"
        );
    }
}

#[test]
fn removal_shifts_indices_and_relinks_neighbors() {
    let mut solution = routing_solution(&[1, 2, 3, 4, 5]);
    let registry = Arc::clone(solution.registry());
    let propagator = ShadowPropagator::new(Arc::clone(&registry));
    let visit_class = registry.entity_class_index("Visit").unwrap();
    let vehicle_class = registry.entity_class_index("Vehicle").unwrap();

    // Remove the middle element (old index 2).
    let list = solution.entities[vehicle_class][0].fields[0]
        .as_list_mut()
        .unwrap();
    let removed = list.remove(2);
    let (_, removed_idx) = removed.as_entity_ref().unwrap();
    propagator.after_list_change(&mut solution, vehicle_class, 0, 0, 2, 2);
    propagator.clear_element_shadows(&mut solution, visit_class, removed_idx);

    let index_of = |i: usize| solution.entities[visit_class][i].fields[2].clone();
    assert_eq!(index_of(0), Value::Int(0));
    assert_eq!(index_of(1), Value::Int(1));
    assert_eq!(index_of(3), Value::Int(2));
    assert_eq!(index_of(4), Value::Int(3));

    // The survivors around the gap are relinked.
    assert_eq!(
        solution.entities[visit_class][1].fields[4],
        Value::Ref(visit_class, 3)
    );
    assert_eq!(
        solution.entities[visit_class][3].fields[3],
        Value::Ref(visit_class, 1)
    );

    // Arrivals downstream of the gap shrink by the removed duration.
    assert_eq!(solution.entities[visit_class][3].fields[5], Value::Int(7));
    assert_eq!(solution.entities[visit_class][4].fields[5], Value::Int(12));
    // Upstream arrivals are untouched.
    assert_eq!(solution.entities[visit_class][1].fields[5], Value::Int(3));

    // The removed element no longer claims membership, and its cascaded
    // values are unassigned rather than stale.
    let removed = &solution.entities[visit_class][removed_idx];
    assert_eq!(removed.fields[1], Value::None);
    assert_eq!(removed.fields[2], Value::None);
    assert_eq!(removed.fields[3], Value::None);
    assert_eq!(removed.fields[4], Value::None);
    assert_eq!(removed.fields[5], Value::None);
    assert_eq!(removed.fields[6], Value::None);
}

#[test]
fn basic_change_on_element_restarts_cascade_at_its_position() {
    let mut solution = routing_solution(&[1, 2, 3, 4, 5]);
    let registry = Arc::clone(solution.registry());
    let propagator = ShadowPropagator::new(Arc::clone(&registry));
    let visit_class = registry.entity_class_index("Visit").unwrap();

    solution.entities[visit_class][2].fields[0] = Value::Int(10);
    propagator.after_basic_change(&mut solution, visit_class, 2);

    let arrival_of = |i: usize| solution.entities[visit_class][i].fields[5].clone();
    assert_eq!(arrival_of(0), Value::Int(1));
    assert_eq!(arrival_of(1), Value::Int(3));
    assert_eq!(arrival_of(2), Value::Int(13));
    assert_eq!(arrival_of(3), Value::Int(17));
    assert_eq!(arrival_of(4), Value::Int(22));
}

#[test]
fn cascade_walk_stops_once_values_settle() {
    // A capped cascade: downstream of the cap, recomputation is a no-op.
    let capped: super::CascadeFn = Arc::new(|e: &Entity, prev: Option<&Value>| {
        let base = prev.and_then(|v| v.as_int()).unwrap_or(0);
        Value::Int((base + e.fields[0].as_int().unwrap_or(0)).min(100))
    });
    let mut registry = DomainRegistry::new();
    registry
        .register_value_range("steps", ValueRangeDef::EntityClass("Step".into()))
        .unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Chain",
            vec![FieldDef::list_variable("steps", "steps")],
        ))
        .unwrap();
    registry
        .register_entity(EntityClassDef::new(
            "Step",
            vec![
                FieldDef::new("weight", FieldType::I64),
                FieldDef::shadow(
                    "total",
                    FieldType::I64,
                    ShadowKind::Cascading {
                        source_fields: vec!["weight".into()],
                        update: capped,
                    },
                ),
            ],
        ))
        .unwrap();
    let registry = registry.freeze().unwrap();

    let mut solution: Solution<SimpleScore> = Solution::new(Arc::clone(&registry));
    let step_class = registry.entity_class_index("Step").unwrap();
    let chain_class = registry.entity_class_index("Chain").unwrap();
    let mut refs = Vec::new();
    for (i, w) in [60, 60, 60, 7].iter().enumerate() {
        let idx = solution.add_entity(
            step_class,
            Entity { id: i as i64, fields: vec![Value::Int(*w)] },
        );
        refs.push(Value::Ref(step_class, idx));
    }
    solution.add_entity(chain_class, Entity { id: 0, fields: vec![Value::List(refs)] });
    let propagator = ShadowPropagator::new(Arc::clone(&registry));
    propagator.refresh_all(&mut solution);

    let total_of = |s: &Solution<SimpleScore>, i: usize| {
        s.entities[step_class][i].fields[1].as_int().unwrap()
    };
    assert_eq!(total_of(&solution, 0), 60);
    assert_eq!(total_of(&solution, 1), 100);
    assert_eq!(total_of(&solution, 2), 100);
    assert_eq!(total_of(&solution, 3), 100);

    // Raising the first weight saturates at the cap; the walk must still
    // leave every downstream value correct.
    solution.entities[step_class][0].fields[0] = Value::Int(90);
    propagator.after_basic_change(&mut solution, step_class, 0);
    assert_eq!(total_of(&solution, 0), 90);
    assert_eq!(total_of(&solution, 1), 100);
    assert_eq!(total_of(&solution, 2), 100);
    assert_eq!(total_of(&solution, 3), 100);
}

#[test]
fn initialization_tracks_genuine_and_membership_shadows() {
    let mut solution = routing_solution(&[1, 2]);
    assert!(solution.is_initialized());
    assert_eq!(solution.unassigned_count(), 0);

    let registry = Arc::clone(solution.registry());
    let vehicle_class = registry.entity_class_index("Vehicle").unwrap();
    let visit_class = registry.entity_class_index("Visit").unwrap();
    let propagator = ShadowPropagator::new(Arc::clone(&registry));
    let list = solution.entities[vehicle_class][0].fields[0]
        .as_list_mut()
        .unwrap();
    list.pop();
    propagator.after_list_change(&mut solution, vehicle_class, 0, 0, 1, 1);
    propagator.clear_element_shadows(&mut solution, visit_class, 1);

    assert!(!solution.is_initialized());
    assert_eq!(solution.unassigned_count(), 1);
}
