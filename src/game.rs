//! Round resolution and match bookkeeping.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    history::{MatchHistory, PlayerMoveHistory},
    types::{AiMode, Move, Winner},
};

pub const DEFAULT_MAX_ROUNDS: u32 = 5;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct Outcome;

impl Outcome {
    pub fn of(player: Move, computer: Move) -> Winner {
        if player == computer {
            Winner::Tie
        } else if player.beats(computer) {
            Winner::Player
        } else {
            Winner::Computer
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub player: u32,
    pub computer: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub score: Score,
    pub rounds_played: u32,
    pub max_rounds: u32,
}

impl MatchState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            score: Score::default(),
            rounds_played: 0,
            max_rounds,
        }
    }

    pub fn is_over(&self) -> bool {
        self.rounds_played >= self.max_rounds
    }

    pub fn progress(&self) -> String {
        format!("{}/{}", self.rounds_played, self.max_rounds)
    }

    pub fn match_winner(&self) -> Winner {
        match self.score.player.cmp(&self.score.computer) {
            std::cmp::Ordering::Greater => Winner::Player,
            std::cmp::Ordering::Less => Winner::Computer,
            std::cmp::Ordering::Equal => Winner::Tie,
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}

/// Settings and timings in effect when the round was played.
#[derive(Clone, Copy, Debug)]
pub struct RoundContext {
    pub ai_mode: AiMode,
    pub ai_difficulty: f64,
    pub detection_duration: Duration,
    pub decision_time: Duration,
    pub timestamp: DateTime<Local>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub timestamp: String,
    #[serde(rename = "user_choice")]
    pub player_move: Move,
    #[serde(rename = "computer_choice")]
    pub computer_move: Move,
    pub winner: Winner,
    pub ai_mode: AiMode,
    pub ai_difficulty: f64,
    #[serde(rename = "user_score")]
    pub player_score: u32,
    pub computer_score: u32,
    pub decision_time: f64,
    pub current_streak: u32,
    pub streak_type: Winner,
    #[serde(rename = "previous_user_move")]
    pub previous_player_move: Option<Move>,
    pub detection_duration: f64,
    pub match_progress: String,
}

/// Sole writer of the score, the player's move history and the round log.
#[derive(Clone, Debug)]
pub struct RoundResolver {
    state: MatchState,
    player_moves: PlayerMoveHistory,
    rounds: MatchHistory,
}

impl RoundResolver {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            state: MatchState::new(max_rounds),
            player_moves: PlayerMoveHistory::new(),
            rounds: MatchHistory::new(),
        }
    }

    /// Plays one round. Returns `None` without touching any state once the
    /// match is over; `reset_match` starts the next one.
    pub fn resolve(
        &mut self,
        player: Move,
        computer: Move,
        ctx: RoundContext,
    ) -> Option<RoundRecord> {
        if self.state.is_over() {
            log::warn!(
                "ignoring round past the end of the match ({})",
                self.state.progress()
            );
            return None;
        }

        self.state.rounds_played += 1;
        let previous_player_move = self.player_moves.last();
        self.player_moves.push(player);

        let winner = Outcome::of(player, computer);
        match winner {
            Winner::Player => self.state.score.player += 1,
            Winner::Computer => self.state.score.computer += 1,
            Winner::Tie => {}
        }

        let current_streak = match self.rounds.last() {
            Some(last) if last.winner == winner => last.current_streak + 1,
            _ => 1,
        };

        let record = RoundRecord {
            round_number: self.state.rounds_played,
            timestamp: ctx.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            player_move: player,
            computer_move: computer,
            winner,
            ai_mode: ctx.ai_mode,
            ai_difficulty: ctx.ai_difficulty,
            player_score: self.state.score.player,
            computer_score: self.state.score.computer,
            decision_time: (ctx.decision_time.as_secs_f64() * 100.0).round() / 100.0,
            current_streak,
            streak_type: winner,
            previous_player_move,
            detection_duration: ctx.detection_duration.as_secs_f64(),
            match_progress: self.state.progress(),
        };

        log::debug!(
            "round {}: {} vs {} -> {} (streak {}, score {}-{})",
            record.match_progress,
            player,
            computer,
            winner,
            current_streak,
            self.state.score.player,
            self.state.score.computer
        );

        self.rounds.append(record.clone());
        Some(record)
    }

    /// Starts a new match. Both histories carry over so the opponent keeps learning.
    pub fn reset_match(&mut self) {
        self.state = MatchState::new(self.state.max_rounds);
    }

    pub fn set_max_rounds(&mut self, max_rounds: u32) {
        self.state.max_rounds = max_rounds;
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn player_moves(&self) -> &PlayerMoveHistory {
        &self.player_moves
    }

    pub fn rounds(&self) -> &MatchHistory {
        &self.rounds
    }
}

impl Default for RoundResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROUNDS)
    }
}
