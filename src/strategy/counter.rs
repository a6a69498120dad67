use rand::Rng;

use super::random_move;
use crate::types::Move;

const RECENT_WINDOW: usize = 3;
const RECENT_BONUS: f64 = 2.0;
const ABSENCE_WINDOW: usize = 5;

/// Recency-weighted frequency of each move, indexed like `Move::ALL`.
pub fn move_weights(moves: &[Move]) -> [f64; 3] {
    let mut weights = [0.0; 3];
    for (i, mv) in moves.iter().enumerate() {
        weights[mv.index()] += 1.0 + 0.1 * i as f64;
    }

    if moves.len() >= RECENT_WINDOW {
        let recent = &moves[moves.len() - RECENT_WINDOW..];
        for mv in Move::ALL {
            if recent.iter().filter(|&&m| m == mv).count() >= 2 {
                weights[mv.index()] += RECENT_BONUS;
            }
        }
    }
    weights
}

pub(super) fn choose<R: Rng + ?Sized>(moves: &[Move], rng: &mut R) -> Move {
    if moves.len() < 2 {
        return random_move(rng);
    }

    if moves.len() >= ABSENCE_WINDOW {
        let last_five = &moves[moves.len() - ABSENCE_WINDOW..];
        if let Some(absent) = Move::ALL.into_iter().find(|mv| !last_five.contains(mv)) {
            log::trace!("{absent} unused in the last {ABSENCE_WINDOW} rounds");
            return absent.counter();
        }
    }

    let weights = move_weights(moves);
    let mut favourite = Move::ALL[0];
    for mv in Move::ALL.into_iter().skip(1) {
        if weights[mv.index()] > weights[favourite.index()] {
            favourite = mv;
        }
    }
    favourite.counter()
}
