use rand::Rng;

use super::{MIN_HISTORY, counter, random_move};
use crate::{
    history::{MatchHistory, most_common},
    types::{Move, Winner},
};

const REPEAT_BASE: f64 = 0.7;
const ALTERNATION_CONFIDENCE: f64 = 0.8;
const CYCLE_CONFIDENCE: f64 = 0.85;
const SEQUENCE_BASE: f64 = 0.6;
const SEQUENCE_CAP: f64 = 0.9;
const POST_LOSS_CONFIDENCE: f64 = 0.65;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detector {
    Repeat,
    Alternation,
    Cycle,
    Sequence,
    PostLoss,
}

impl Detector {
    pub fn label(&self) -> &'static str {
        match self {
            Detector::Repeat => "repeat",
            Detector::Alternation => "alternation",
            Detector::Cycle => "cycle",
            Detector::Sequence => "sequence",
            Detector::PostLoss => "post-loss",
        }
    }
}

/// A guess at the player's next move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub predicted: Move,
    pub confidence: f64,
    pub source: Detector,
}

impl Prediction {
    fn new(predicted: Move, confidence: f64, source: Detector) -> Self {
        Self {
            predicted,
            confidence,
            source,
        }
    }
}

/// Runs every detector in order. `moves` is oldest first.
pub fn predictions(moves: &[Move], rounds: &MatchHistory) -> Vec<Prediction> {
    let mut found = Vec::new();
    if moves.len() < MIN_HISTORY {
        return found;
    }
    let len = moves.len();

    let last_three = &moves[len - 3..];
    if last_three.iter().all(|&m| m == last_three[0]) {
        let blocks = (0..len - 3)
            .step_by(3)
            .filter(|&i| moves[i] == moves[i + 1] && moves[i] == moves[i + 2])
            .count();
        let confidence = REPEAT_BASE + 0.1 * blocks.min(3) as f64;
        found.push(Prediction::new(last_three[0], confidence, Detector::Repeat));
    }

    if len >= 4 {
        let four = &moves[len - 4..];
        if four[0] == four[2] && four[1] == four[3] {
            found.push(Prediction::new(four[0], ALTERNATION_CONFIDENCE, Detector::Alternation));
        }
    }

    if len >= 6 {
        let six = &moves[len - 6..];
        if six[..3] == six[3..] {
            found.push(Prediction::new(six[0], CYCLE_CONFIDENCE, Detector::Cycle));
        }
    }

    for seq_len in 2..5.min(len - 1) {
        let tail = &moves[len - seq_len..];
        let followers: Vec<Move> = (0..len - seq_len)
            .filter(|&i| &moves[i..i + seq_len] == tail)
            .map(|i| moves[i + seq_len])
            .collect();
        if let Some((next, count)) = most_common(followers.iter().copied()) {
            let ratio = count as f64 / followers.len() as f64;
            let confidence = SEQUENCE_CAP.min(SEQUENCE_BASE + ratio * seq_len as f64 / 4.0);
            found.push(Prediction::new(next, confidence, Detector::Sequence));
        }
    }

    if rounds.len() >= 2 {
        if let Some(last) = rounds.last().filter(|r| r.winner == Winner::Computer) {
            found.push(Prediction::new(
                last.computer_move.counter(),
                POST_LOSS_CONFIDENCE,
                Detector::PostLoss,
            ));
        }
    }

    found
}

/// Highest confidence, earliest detector on ties.
pub fn best_prediction(found: &[Prediction]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    for prediction in found {
        if best.is_none_or(|b| prediction.confidence > b.confidence) {
            best = Some(*prediction);
        }
    }
    best
}

pub(super) fn choose<R: Rng + ?Sized>(moves: &[Move], rounds: &MatchHistory, rng: &mut R) -> Move {
    if moves.len() < MIN_HISTORY {
        return random_move(rng);
    }

    match best_prediction(&predictions(moves, rounds)) {
        Some(best) => {
            log::debug!(
                "{} detector predicts {} ({:.2})",
                best.source.label(),
                best.predicted,
                best.confidence
            );
            best.predicted.counter()
        }
        None => counter::choose(moves, rng),
    }
}
