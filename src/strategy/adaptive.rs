use rand::Rng;

use super::{counter, pattern, random_move};
use crate::{
    game::RoundRecord,
    history::MatchHistory,
    types::{Move, Winner},
};

const STREAK_TRIGGER: u32 = 2;
const KEEP_WINNING_CHANCE: f64 = 0.7;
const ANTICIPATE_CHANCE: f64 = 0.6;
const LOSING_PATTERN_CHANCE: f64 = 0.5;
/// Pattern, counter, random.
const MIX: [f64; 3] = [0.5, 0.3, 0.2];

fn on_streak(last: &RoundRecord, side: Winner) -> bool {
    last.streak_type == side && last.current_streak >= STREAK_TRIGGER
}

pub(super) fn choose<R: Rng + ?Sized>(moves: &[Move], rounds: &MatchHistory, rng: &mut R) -> Move {
    if let Some(last) = rounds.last() {
        if on_streak(last, Winner::Computer) && rng.random_bool(KEEP_WINNING_CHANCE) {
            // The player just lost with `player_move` and is expected to switch to its counter.
            return if rng.random_bool(ANTICIPATE_CHANCE) {
                last.player_move.counter().counter()
            } else {
                last.computer_move
            };
        }

        if on_streak(last, Winner::Player) {
            log::debug!("adaptive: losing streak of {}, shaking things up", last.current_streak);
            return if rng.random_bool(LOSING_PATTERN_CHANCE) {
                pattern::choose(moves, rounds, rng)
            } else {
                random_move(rng)
            };
        }
    }

    let roll = rng.random::<f64>();
    if roll < MIX[0] {
        pattern::choose(moves, rounds, rng)
    } else if roll < MIX[0] + MIX[1] {
        counter::choose(moves, rng)
    } else {
        random_move(rng)
    }
}
