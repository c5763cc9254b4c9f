//! Tests for solver configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "full_assert"
        random_seed = 42

        [termination]
        seconds_spent_limit = 30
        step_count_limit = 1000
        best_score_limit = "0hard/0soft"

        [[phases]]
        type = "construction_heuristic"

        [[phases]]
        type = "local_search"
        accepted_count_limit = 1
        [phases.acceptor]
        type = "late_acceptance"
        late_acceptance_size = 400
    "#;

    let config = SolverConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
    assert_eq!(config.random_seed, Some(42));
    let termination = config.termination.unwrap();
    assert_eq!(termination.seconds_spent_limit, Some(30));
    assert_eq!(termination.step_count_limit, Some(1000));
    assert_eq!(termination.best_score_limit.as_deref(), Some("0hard/0soft"));
    assert!(termination.is_bounded());
    assert_eq!(config.phases.len(), 2);
    match &config.phases[1] {
        PhaseConfig::LocalSearch(local_search) => {
            assert_eq!(local_search.accepted_count_limit, Some(1));
            match local_search.acceptor.as_ref().unwrap() {
                AcceptorConfig::LateAcceptance(late) => {
                    assert_eq!(late.late_acceptance_size, Some(400));
                }
                other => panic!("unexpected acceptor: {other:?}"),
            }
        }
        other => panic!("unexpected phase: {other:?}"),
    }
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: reproducible
        random_seed: 42
        termination:
          minutes_spent_limit: 2
          unimproved_seconds_spent_limit: 5
        phases:
          - type: construction_heuristic
          - type: local_search
            acceptor:
              type: simulated_annealing
              starting_temperature: 2.0
              decay: 0.99
    "#;

    let config = SolverConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.random_seed, Some(42));
    let termination = config.termination.unwrap();
    assert_eq!(termination.time_limit(), Some(Duration::from_secs(120)));
    assert_eq!(
        termination.unimproved_time_limit(),
        Some(Duration::from_secs(5))
    );
}

#[test]
fn test_builder() {
    let config = SolverConfig::new()
        .with_random_seed(123)
        .with_termination_seconds(60)
        .with_phase(PhaseConfig::ConstructionHeuristic(
            ConstructionHeuristicConfig::default(),
        ))
        .with_phase(PhaseConfig::LocalSearch(LocalSearchConfig::default()));

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.time_limit(), Some(Duration::from_secs(60)));
    assert_eq!(config.phases.len(), 2);
}

#[test]
fn test_defaults() {
    let config = SolverConfig::from_toml_str("").unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert!(config.random_seed.is_none());
    assert!(config.termination.is_none());
    assert!(config.phases.is_empty());
    assert_eq!(config.time_limit(), None);
}

#[test]
fn test_invalid_toml_is_rejected() {
    let err = SolverConfig::from_toml_str("[[phases]]\ntype = \"exhaustive\"").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}
