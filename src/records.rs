//! Round log export. Callers pick the destination.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::game::{RoundRecord, TIMESTAMP_FORMAT};

pub const CSV_HEADER: [&str; 15] = [
    "round_number",
    "timestamp",
    "user_choice",
    "computer_choice",
    "winner",
    "ai_mode",
    "ai_difficulty",
    "user_score",
    "computer_score",
    "decision_time",
    "current_streak",
    "streak_type",
    "previous_user_move",
    "detection_duration",
    "match_progress",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub start_time: String,
    pub game_version: String,
    pub rounds: Vec<RoundRecord>,
}

impl SessionLog {
    pub fn new(started: DateTime<Local>) -> Self {
        Self {
            session_id: started.format("%Y%m%d_%H%M%S").to_string(),
            start_time: started.format(TIMESTAMP_FORMAT).to_string(),
            game_version: env!("CARGO_PKG_VERSION").to_string(),
            rounds: Vec::new(),
        }
    }

    pub fn with_rounds(mut self, rounds: &[RoundRecord]) -> Self {
        self.rounds.extend_from_slice(rounds);
        self
    }

    pub fn push(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }
}

pub fn write_json<W: Write>(writer: W, log: &SessionLog) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, log)
}

pub fn write_csv<W: Write>(mut writer: W, rounds: &[RoundRecord]) -> io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER.join(","))?;
    for r in rounds {
        writeln!(
            writer,
            "{},{},{},{},{},{},{:?},{},{},{:?},{},{},{},{:?},{}",
            r.round_number,
            r.timestamp,
            r.player_move.key(),
            r.computer_move.key(),
            r.winner.key(),
            r.ai_mode.key(),
            r.ai_difficulty,
            r.player_score,
            r.computer_score,
            r.decision_time,
            r.current_streak,
            r.streak_type.key(),
            r.previous_player_move.map(|m| m.key()).unwrap_or(""),
            r.detection_duration,
            r.match_progress,
        )?;
    }
    writer.flush()
}
