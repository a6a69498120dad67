use std::time::Duration;

use chrono::Local;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::Serialize;

use super::{OpponentEngine, random_move};
use crate::{
    game::{RoundContext, RoundResolver},
    types::{AiMode, Move, Winner},
};

/// How a synthetic player picks moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerProfile {
    Repeater(Move),
    /// Rock, paper, scissors, rock...
    Cycler,
    /// Leans on one move without committing to it.
    Biased(Move),
    Alternator(Move, Move),
    Uniform,
}

impl PlayerProfile {
    /// Profiles with an exploitable habit.
    pub const PREDICTABLE: [PlayerProfile; 4] = [
        PlayerProfile::Repeater(Move::Rock),
        PlayerProfile::Cycler,
        PlayerProfile::Biased(Move::Paper),
        PlayerProfile::Alternator(Move::Rock, Move::Scissors),
    ];

    /// Chance of following the habit on a given round.
    pub fn adherence(&self) -> f64 {
        match self {
            PlayerProfile::Repeater(_) | PlayerProfile::Cycler | PlayerProfile::Alternator(..) => 0.8,
            PlayerProfile::Biased(_) => 0.6,
            PlayerProfile::Uniform => 0.0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PlayerProfile::Repeater(mv) => format!("repeater({})", mv.key()),
            PlayerProfile::Cycler => "cycler".to_string(),
            PlayerProfile::Biased(mv) => format!("biased({})", mv.key()),
            PlayerProfile::Alternator(a, b) => format!("alternator({},{})", a.key(), b.key()),
            PlayerProfile::Uniform => "uniform".to_string(),
        }
    }
}

pub struct ScriptedPlayer<R: Rng = SmallRng> {
    profile: PlayerProfile,
    step: usize,
    rng: R,
}

impl ScriptedPlayer<SmallRng> {
    pub fn seeded(profile: PlayerProfile, seed: u64) -> Self {
        Self {
            profile,
            step: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> ScriptedPlayer<R> {
    pub fn next_move(&mut self) -> Move {
        let step = self.step;
        self.step += 1;

        if !self.rng.random_bool(self.profile.adherence()) {
            return random_move(&mut self.rng);
        }
        match self.profile {
            PlayerProfile::Repeater(mv) | PlayerProfile::Biased(mv) => mv,
            PlayerProfile::Cycler => Move::ALL[step % Move::ALL.len()],
            PlayerProfile::Alternator(a, b) => {
                if step % 2 == 0 {
                    a
                } else {
                    b
                }
            }
            PlayerProfile::Uniform => random_move(&mut self.rng),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub rounds: u64,
    pub computer_wins: u64,
    pub player_wins: u64,
    pub ties: u64,
}

impl SimulationReport {
    fn record(&mut self, winner: Winner) {
        self.rounds += 1;
        match winner {
            Winner::Computer => self.computer_wins += 1,
            Winner::Player => self.player_wins += 1,
            Winner::Tie => self.ties += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            rounds: self.rounds + other.rounds,
            computer_wins: self.computer_wins + other.computer_wins,
            player_wins: self.player_wins + other.player_wins,
            ties: self.ties + other.ties,
        }
    }

    /// Computer wins over decisive rounds; 0 when every round tied.
    pub fn decisive_win_rate(&self) -> f64 {
        let decisive = self.computer_wins + self.player_wins;
        if decisive == 0 {
            return 0.0;
        }
        self.computer_wins as f64 / decisive as f64
    }
}

/// Plays `sequences` independent matches of `rounds` rounds each, cycling through
/// `profiles`. Sequences run in parallel; the result only depends on `seed`.
pub fn simulate(
    mode: AiMode,
    difficulty: f64,
    profiles: &[PlayerProfile],
    sequences: usize,
    rounds: usize,
    seed: u64,
) -> SimulationReport {
    if profiles.is_empty() {
        log::warn!("simulation requested without player profiles");
        return SimulationReport::default();
    }

    let report = (0..sequences)
        .into_par_iter()
        .map(|i| {
            let sequence_seed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(i as u64);
            let mut engine = OpponentEngine::seeded(mode, difficulty, sequence_seed);
            let mut player = ScriptedPlayer::seeded(profiles[i % profiles.len()], !sequence_seed);
            play_sequence(&mut engine, &mut player, rounds, difficulty)
        })
        .reduce(SimulationReport::default, SimulationReport::merge);

    log::info!(
        "{mode} at difficulty {difficulty:.1}: {} rounds, win rate {:.3}",
        report.rounds,
        report.decisive_win_rate()
    );
    report
}

fn play_sequence<E: Rng, P: Rng>(
    engine: &mut OpponentEngine<E>,
    player: &mut ScriptedPlayer<P>,
    rounds: usize,
    difficulty: f64,
) -> SimulationReport {
    let mut resolver = RoundResolver::new(u32::try_from(rounds).unwrap_or(u32::MAX));
    let mut report = SimulationReport::default();
    for _ in 0..rounds {
        let computer = engine.choose_move(resolver.player_moves(), resolver.rounds());
        let ctx = RoundContext {
            ai_mode: engine.mode(),
            ai_difficulty: difficulty,
            detection_duration: Duration::ZERO,
            decision_time: Duration::ZERO,
            timestamp: Local::now(),
        };
        let Some(record) = resolver.resolve(player.next_move(), computer, ctx) else {
            break;
        };
        report.record(record.winner);
    }
    report
}
