//! Computer move selection from the player's move history.

mod adaptive;
mod counter;
mod pattern;
mod simulate;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    history::{MatchHistory, PlayerMoveHistory},
    types::{AiMode, Move},
};

pub use counter::move_weights;
pub use pattern::{Detector, Prediction, best_prediction, predictions};
pub use simulate::{PlayerProfile, ScriptedPlayer, SimulationReport, simulate};

/// Below this many recorded player moves every mode plays randomly.
pub const MIN_HISTORY: usize = 3;
pub const DEFAULT_DIFFICULTY: f64 = 0.7;

pub struct OpponentEngine<R: Rng = SmallRng> {
    mode: AiMode,
    difficulty: f64,
    rng: R,
}

impl OpponentEngine<SmallRng> {
    pub fn new(mode: AiMode, difficulty: f64) -> Self {
        Self::with_rng(mode, difficulty, SmallRng::from_os_rng())
    }

    pub fn seeded(mode: AiMode, difficulty: f64, seed: u64) -> Self {
        Self::with_rng(mode, difficulty, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> OpponentEngine<R> {
    pub fn with_rng(mode: AiMode, difficulty: f64, rng: R) -> Self {
        Self {
            mode,
            difficulty: difficulty.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn mode(&self) -> AiMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AiMode) {
        self.mode = mode;
    }

    /// Probability of playing the mode's strategy instead of a random move.
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: f64) {
        self.difficulty = difficulty.clamp(0.0, 1.0);
    }

    /// Never fails: without enough data the choice degrades to uniform random.
    pub fn choose_move(&mut self, history: &PlayerMoveHistory, rounds: &MatchHistory) -> Move {
        if history.len() < MIN_HISTORY
            || self.mode == AiMode::Random
            || self.rng.random::<f64>() > self.difficulty
        {
            return random_move(&mut self.rng);
        }

        let moves = history.to_vec();
        let choice = match self.mode {
            AiMode::Random => random_move(&mut self.rng),
            AiMode::Counter => counter::choose(&moves, &mut self.rng),
            AiMode::Pattern => pattern::choose(&moves, rounds, &mut self.rng),
            AiMode::Adaptive => adaptive::choose(&moves, rounds, &mut self.rng),
        };
        log::debug!("{} strategy picked {choice}", self.mode);
        choice
    }
}

pub(crate) fn random_move<R: Rng + ?Sized>(rng: &mut R) -> Move {
    Move::ALL[rng.random_range(0..Move::ALL.len())]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Local;

    use super::*;
    use crate::game::{RoundContext, RoundResolver};

    fn history(moves: &[Move]) -> PlayerMoveHistory {
        moves.iter().copied().collect()
    }

    fn ctx() -> RoundContext {
        RoundContext {
            ai_mode: AiMode::Pattern,
            ai_difficulty: 1.0,
            detection_duration: Duration::from_secs(3),
            decision_time: Duration::ZERO,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn short_history_is_random_but_valid() {
        let mut engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 7);
        let short = history(&[Move::Rock, Move::Rock]);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[engine.choose_move(&short, &MatchHistory::new()).index()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn zero_difficulty_ignores_patterns() {
        let mut engine = OpponentEngine::seeded(AiMode::Pattern, 0.0, 11);
        let repeats = history(&[Move::Rock; 6]);
        let papers = (0..300)
            .filter(|_| engine.choose_move(&repeats, &MatchHistory::new()) == Move::Paper)
            .count();
        assert!(papers < 200, "expected a random spread, got {papers} papers");
    }

    #[test]
    fn counter_punishes_an_unused_move() {
        let mut engine = OpponentEngine::seeded(AiMode::Counter, 1.0, 3);
        let moves = history(&[Move::Rock, Move::Rock, Move::Paper, Move::Rock, Move::Paper]);
        for _ in 0..50 {
            assert_eq!(engine.choose_move(&moves, &MatchHistory::new()), Move::Rock);
        }
    }

    #[test]
    fn pattern_counters_a_triple_repeat() {
        let moves = [Move::Rock, Move::Rock, Move::Rock];
        let best = best_prediction(&predictions(&moves, &MatchHistory::new())).unwrap();
        assert_eq!(best.predicted, Move::Rock);
        assert!(best.confidence >= 0.7);

        let mut engine = OpponentEngine::seeded(AiMode::Pattern, 1.0, 5);
        for _ in 0..20 {
            assert_eq!(engine.choose_move(&history(&moves), &MatchHistory::new()), Move::Paper);
        }
    }

    #[test]
    fn adaptive_stays_inside_its_move_set() {
        let mut resolver = RoundResolver::new(50);
        let mut engine = OpponentEngine::seeded(AiMode::Adaptive, 1.0, 99);
        for round in 0..50 {
            let computer = engine.choose_move(resolver.player_moves(), resolver.rounds());
            resolver.resolve(Move::ALL[round % 3], computer, ctx());
        }
        assert_eq!(resolver.rounds().len(), 50);
        assert_eq!(resolver.player_moves().len(), 10);
    }

    #[test]
    fn difficulty_is_clamped() {
        let mut engine = OpponentEngine::seeded(AiMode::Counter, 3.0, 1);
        assert_eq!(engine.difficulty(), 1.0);
        engine.set_difficulty(-0.5);
        assert_eq!(engine.difficulty(), 0.0);
    }
}
