use std::sync::atomic::Ordering;
use std::time::Duration;

use lodestar_core::score::HardSoftScore;

use crate::scope::SolverScope;
use crate::test_util::{shift_director, shift_registry};

use super::{
    AndTermination, BestScoreTermination, ExternalTermination, NeverTermination, OrTermination,
    StepCountTermination, Termination, TimeTermination, UnimprovedTimeTermination,
};

fn scope() -> SolverScope<HardSoftScore> {
    let registry = shift_registry();
    let director = shift_director(&registry, 2, &[(Some(0), 0, 10), (Some(1), 0, 10)]);
    SolverScope::with_seed(director, 0)
}

#[test]
fn step_count_limit_fires_once_steps_run_out() {
    let mut scope = scope();
    let termination = StepCountTermination::new(3);
    assert!(!Termination::<HardSoftScore>::is_terminated(&termination, &scope));
    for _ in 0..3 {
        scope.increment_step_count();
    }
    assert!(Termination::<HardSoftScore>::is_terminated(&termination, &scope));
}

#[test]
fn best_score_limit_waits_for_a_best_solution() {
    let mut scope = scope();
    let termination = BestScoreTermination::new(HardSoftScore::ZERO);
    // No best solution recorded yet.
    assert!(!termination.is_terminated(&scope));
    scope.update_best_solution().unwrap();
    // Both shifts are assigned and disjoint, so the best score is zero.
    assert!(termination.is_terminated(&scope));
    assert!(!BestScoreTermination::new(HardSoftScore::of_soft(1)).is_terminated(&scope));
}

#[test]
fn external_flag_terminates_when_raised() {
    let scope = scope();
    let termination = ExternalTermination::new();
    assert!(!Termination::<HardSoftScore>::is_terminated(&termination, &scope));
    termination.flag().store(true, Ordering::SeqCst);
    assert!(Termination::<HardSoftScore>::is_terminated(&termination, &scope));
}

#[test]
fn time_limits_use_the_solving_clock() {
    let mut scope = scope();
    scope.start_solving();
    assert!(TimeTermination::new(Duration::ZERO).is_terminated(&scope));
    assert!(!TimeTermination::from_seconds(3600).is_terminated(&scope));
    assert!(UnimprovedTimeTermination::new(Duration::ZERO).is_terminated(&scope));
    assert!(!UnimprovedTimeTermination::new(Duration::from_secs(3600)).is_terminated(&scope));
}

#[test]
fn composites_combine_their_children() {
    let mut scope = scope();
    scope.start_solving();
    let expired: Box<dyn Termination<HardSoftScore>> =
        Box::new(TimeTermination::new(Duration::ZERO));
    let pending: Box<dyn Termination<HardSoftScore>> = Box::new(StepCountTermination::new(100));

    let or = OrTermination::new(vec![
        Box::new(TimeTermination::new(Duration::ZERO)) as Box<dyn Termination<HardSoftScore>>,
        Box::new(StepCountTermination::new(100)),
    ]);
    assert!(or.is_terminated(&scope));

    let and = AndTermination::new(vec![expired, pending]);
    assert!(!and.is_terminated(&scope));

    // An empty conjunction never fires, matching the no-limit default.
    assert!(!AndTermination::<HardSoftScore>::new(vec![]).is_terminated(&scope));
    assert!(!NeverTermination.is_terminated(&scope));
}
