use std::time::Duration;

use chrono::Local;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rps_vision::{
    AiMode, Move, OpponentEngine, RoundResolver,
    game::RoundContext,
    history::{MatchHistory, PlayerMoveHistory},
    strategy::{Detector, best_prediction, predictions},
};

fn ctx(mode: AiMode) -> RoundContext {
    RoundContext {
        ai_mode: mode,
        ai_difficulty: 1.0,
        detection_duration: Duration::from_secs(3),
        decision_time: Duration::ZERO,
        timestamp: Local::now(),
    }
}

#[test]
fn counter_always_answers_a_missing_move() {
    let mut rng = SmallRng::seed_from_u64(2024);
    let mut engine = OpponentEngine::seeded(AiMode::Counter, 1.0, 8);
    let mut checked = 0;

    for _ in 0..500 {
        let len = rng.random_range(5..=10);
        let history: PlayerMoveHistory = (0..len)
            .map(|_| Move::ALL[rng.random_range(0..3)])
            .collect();
        let last_five = history.tail(5);
        let Some(absent) = Move::ALL.into_iter().find(|mv| !last_five.contains(mv)) else {
            continue;
        };
        assert_eq!(
            engine.choose_move(&history, &MatchHistory::new()),
            absent.counter(),
            "{:?}",
            history.to_vec()
        );
        checked += 1;
    }
    assert!(checked > 50);
}

#[test]
fn pattern_answers_a_repeated_move() {
    for mv in Move::ALL {
        let history: PlayerMoveHistory = [mv; 3].into_iter().collect();
        let found = predictions(&history.to_vec(), &MatchHistory::new());
        let best = best_prediction(&found).unwrap();
        assert_eq!(best.source, Detector::Repeat);
        assert_eq!(best.predicted, mv);
        assert!(best.confidence >= 0.7);

        let mut engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 4);
        assert_eq!(engine.choose_move(&history, &MatchHistory::new()), mv.counter());
    }
}

#[test]
fn seeded_engines_agree() {
    let mut resolver = RoundResolver::new(40);
    let mut a = OpponentEngine::seeded(AiMode::Adaptive, 0.9, 77);
    let mut b = OpponentEngine::seeded(AiMode::Adaptive, 0.9, 77);
    for round in 0..40 {
        let left = a.choose_move(resolver.player_moves(), resolver.rounds());
        let right = b.choose_move(resolver.player_moves(), resolver.rounds());
        assert_eq!(left, right, "round {round}");
        let player = [Move::Rock, Move::Rock, Move::Paper][round % 3];
        resolver.resolve(player, left, ctx(AiMode::Adaptive));
    }
}

#[test]
fn pattern_engine_exploits_a_cycle_over_a_match() {
    let mut resolver = RoundResolver::new(60);
    let mut engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 5);
    for round in 0..60 {
        let computer = engine.choose_move(resolver.player_moves(), resolver.rounds());
        resolver.resolve(Move::ALL[round % 3], computer, ctx(AiMode::Pattern));
    }

    // With the cycle in the history every later round is countered.
    let late = &resolver.rounds().rounds()[10..];
    assert!(late.iter().all(|r| r.computer_move == r.player_move.counter()));
    assert!(resolver.state().score.computer >= 50);
}
