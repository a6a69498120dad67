use serde::Serialize;

use crate::{
    game::RoundRecord,
    types::{AiMode, Move, Winner},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub count: u32,
    /// Truncated integer percentage of the total.
    pub percent: u32,
}

impl Tally {
    fn of(count: u32, total: u32) -> Self {
        let percent = if total == 0 { 0 } else { count * 100 / total };
        Self { count, percent }
    }
}

/// The move the player most often chose right after `from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Move,
    pub to: Move,
    pub share: Tally,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ModeRecord {
    pub mode: AiMode,
    pub rounds: u32,
    pub computer_wins: Tally,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub total_rounds: u32,
    pub player_wins: Tally,
    pub computer_wins: Tally,
    pub ties: Tally,
    /// Indexed like `Move::ALL`.
    pub player_moves: [Tally; 3],
    pub longest_player_streak: u32,
    pub longest_computer_streak: u32,
    pub transitions: Vec<Transition>,
    /// In order of first use.
    pub modes: Vec<ModeRecord>,
}

impl MatchStats {
    pub fn from_rounds(rounds: &[RoundRecord]) -> Self {
        let total = rounds.len() as u32;
        let longest = |side: Winner| {
            rounds
                .iter()
                .filter(|r| r.streak_type == side)
                .map(|r| r.current_streak)
                .max()
                .unwrap_or(0)
        };

        let player_moves = Move::ALL.map(|mv| Tally::of(count(rounds, |r| r.player_move == mv), total));

        let mut table = [[0u32; 3]; 3];
        for pair in rounds.windows(2) {
            table[pair[0].player_move.index()][pair[1].player_move.index()] += 1;
        }
        let transitions = Move::ALL
            .into_iter()
            .filter_map(|from| {
                let row = table[from.index()];
                let seen: u32 = row.iter().sum();
                if seen == 0 {
                    return None;
                }
                let mut to = Move::ALL[0];
                for mv in Move::ALL.into_iter().skip(1) {
                    if row[mv.index()] > row[to.index()] {
                        to = mv;
                    }
                }
                Some(Transition {
                    from,
                    to,
                    share: Tally::of(row[to.index()], seen),
                })
            })
            .collect();

        let mut modes: Vec<ModeRecord> = Vec::new();
        for round in rounds {
            let position = match modes.iter().position(|m| m.mode == round.ai_mode) {
                Some(position) => position,
                None => {
                    modes.push(ModeRecord {
                        mode: round.ai_mode,
                        rounds: 0,
                        computer_wins: Tally::default(),
                    });
                    modes.len() - 1
                }
            };
            let entry = &mut modes[position];
            entry.rounds += 1;
            let wins = entry.computer_wins.count + u32::from(round.winner == Winner::Computer);
            entry.computer_wins = Tally::of(wins, entry.rounds);
        }

        Self {
            total_rounds: total,
            player_wins: Tally::of(count(rounds, |r| r.winner == Winner::Player), total),
            computer_wins: Tally::of(count(rounds, |r| r.winner == Winner::Computer), total),
            ties: Tally::of(count(rounds, |r| r.winner == Winner::Tie), total),
            player_moves,
            longest_player_streak: longest(Winner::Player),
            longest_computer_streak: longest(Winner::Computer),
            transitions,
            modes,
        }
    }

    pub fn moves(&self, mv: Move) -> Tally {
        self.player_moves[mv.index()]
    }

    /// Human-readable report, one line per figure.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.total_rounds == 0 {
            return vec!["No games played yet!".to_string()];
        }

        let mut lines = vec![
            format!("Total Rounds: {}", self.total_rounds),
            format!("Your Wins: {} ({}%)", self.player_wins.count, self.player_wins.percent),
            format!(
                "Computer Wins: {} ({}%)",
                self.computer_wins.count, self.computer_wins.percent
            ),
            format!("Ties: {} ({}%)", self.ties.count, self.ties.percent),
        ];
        for mv in Move::ALL {
            let tally = self.moves(mv);
            lines.push(format!("{}: {} ({}%)", mv.display_name(), tally.count, tally.percent));
        }
        lines.push(format!("Your Streak: {}", self.longest_player_streak));
        lines.push(format!("Computer Streak: {}", self.longest_computer_streak));
        for t in &self.transitions {
            lines.push(format!("After {}: {} ({}%)", t.from, t.to, t.share.percent));
        }
        for m in &self.modes {
            lines.push(format!(
                "{}: {}/{} ({}%)",
                m.mode.display_name(),
                m.computer_wins.count,
                m.rounds,
                m.computer_wins.percent
            ));
        }
        lines
    }
}

fn count(rounds: &[RoundRecord], pred: impl Fn(&RoundRecord) -> bool) -> u32 {
    rounds.iter().filter(|r| pred(r)).count() as u32
}
