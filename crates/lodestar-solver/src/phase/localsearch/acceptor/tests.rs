use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lodestar_core::score::SimpleScore;

use super::*;

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(0)
}

fn score(v: i64) -> SimpleScore {
    SimpleScore::of(v)
}

#[test]
fn hill_climbing_rejects_worsening_moves() {
    let mut acceptor = HillClimbingAcceptor::new();
    let mut rng = rng();
    assert!(acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-4), 1));
    assert!(acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-5), 2));
    assert!(!acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-6), 3));
}

#[test]
fn tabu_rejects_recent_keys_but_honors_aspiration() {
    let mut acceptor = TabuSearchAcceptor::new(2);
    let mut rng = rng();
    Acceptor::<SimpleScore>::phase_started(&mut acceptor, score(-10));

    acceptor.step_ended(score(-9), Some(7));
    assert!(!acceptor.is_accepted(&mut rng, score(-9), score(-9), score(-9), 7));
    // Aspiration: better than the best seen so far.
    assert!(acceptor.is_accepted(&mut rng, score(-9), score(-9), score(-8), 7));

    // After tabu_size more steps with other keys, 7 expires.
    acceptor.step_ended(score(-9), Some(8));
    acceptor.step_ended(score(-9), Some(9));
    assert!(acceptor.is_accepted(&mut rng, score(-9), score(-9), score(-9), 7));
}

#[test]
fn frozen_annealer_never_accepts_worsening_moves() {
    // Temperature at zero degenerates to pure greed.
    let mut acceptor = SimulatedAnnealingAcceptor::new(0.0, 0.5);
    let mut rng = rng();
    Acceptor::<SimpleScore>::phase_started(&mut acceptor, score(0));
    for i in 0..1000 {
        assert!(!acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-6), i));
    }
    // Sideways and improving moves still pass.
    assert!(acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-5), 0));
    assert!(acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-1), 0));
}

#[test]
fn hot_annealer_accepts_some_worsening_moves() {
    let mut acceptor = SimulatedAnnealingAcceptor::new(100.0, 1.0);
    let mut rng = rng();
    Acceptor::<SimpleScore>::phase_started(&mut acceptor, score(0));
    let accepted = (0..1000)
        .filter(|&i| acceptor.is_accepted(&mut rng, score(-5), score(-5), score(-7), i))
        .count();
    // exp(-2/100) is roughly 0.98.
    assert!(accepted > 900, "accepted {accepted} of 1000");
}

#[test]
fn late_acceptance_compares_against_the_ring() {
    let mut acceptor = LateAcceptanceAcceptor::new(2);
    let mut rng = rng();
    acceptor.phase_started(score(-10));

    // Worse than last step but no worse than the score two steps back.
    assert!(acceptor.is_accepted(&mut rng, score(-8), score(-8), score(-9), 1));
    acceptor.step_ended(score(-9), Some(1));
    acceptor.step_ended(score(-8), Some(2));
    // Ring now holds [-9, -8]; cursor points at -9.
    assert!(acceptor.is_accepted(&mut rng, score(-8), score(-8), score(-9), 3));
    assert!(!acceptor.is_accepted(&mut rng, score(-8), score(-8), score(-10), 4));
}
